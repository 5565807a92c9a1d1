//! Integration tests for the `fabcheck` CLI binary.
//!
//! Argument parsing, help output, local commands, and a few controller
//! commands against a mock controller.
#![allow(clippy::unwrap_used)]

use std::io::Write;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `fabcheck` binary with env isolation.
///
/// Clears `FABCHECK_*` variables and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn fabcheck_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fabcheck");
    cmd.env("HOME", "/tmp/fabcheck-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fabcheck-cli-test-nonexistent")
        .env_remove("FABCHECK_CONFIG")
        .env_remove("FABCHECK_PROFILE")
        .env_remove("FABCHECK_CONTROLLER")
        .env_remove("FABCHECK_USERNAME")
        .env_remove("FABCHECK_PASSWORD")
        .env_remove("FABCHECK_OUTPUT")
        .env_remove("FABCHECK_INSECURE")
        .env_remove("FABCHECK_TIMEOUT")
        .env_remove("FABCHECK_HOSTNAME")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fabcheck_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    fabcheck_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("tenants")
            .and(predicate::str::contains("packet"))
            .and(predicate::str::contains("check")),
    );
}

#[test]
fn test_version_flag() {
    fabcheck_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fabcheck"));
}

#[test]
fn test_invalid_output_format() {
    let output = fabcheck_cmd()
        .args(["--output", "xml", "tenants", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("xml"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_zsh() {
    fabcheck_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    fabcheck_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Packet ──────────────────────────────────────────────────────────

#[test]
fn test_packet_build_prints_hex() {
    fabcheck_cmd()
        .args(["packet", "build", "eth", "--dst-mac", "ff:ff:ff:ff:ff:ff", "--len", "60"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ffffffffffff").and(predicate::str::contains("\n")));
}

#[test]
fn test_packet_build_json_reports_layers() {
    let output = fabcheck_cmd()
        .args(["-o", "json", "packet", "build", "udp", "--vlan", "20"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["length"], 100);
    assert_eq!(value["layers"][1], "dot1q");
}

#[test]
fn test_packet_build_rejects_bad_mac() {
    let output = fabcheck_cmd()
        .args(["packet", "build", "tcp", "--src-mac", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("src-mac"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    fabcheck_cmd()
        .args(["--config", "/tmp/elsewhere/fabcheck.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/elsewhere/fabcheck.toml"));
}

#[test]
fn test_config_show_masks_password() {
    let file = config_file(
        "[controller]\n\
         url = \"http://10.1.1.5:8181/mars/\"\n\
         username = \"operator\"\n\
         password = \"hunter2\"\n",
    );
    fabcheck_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("10.1.1.5")
                .and(predicate::str::contains("********"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_unknown_profile_is_usage_error() {
    let output = fabcheck_cmd()
        .args(["--profile", "bed9", "topology", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("bed9"));
}

#[test]
fn test_missing_password_is_auth_error() {
    let output = fabcheck_cmd()
        .args(["--controller", "http://127.0.0.1:9/", "-u", "operator", "tenants", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("operator"));
}

// ── Controller commands ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_tenants_list_plain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mars/v1/tenants/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenants": [
                {"name": "t1", "type": "Normal"},
                {"name": "system", "type": "System"}
            ]
        })))
        .mount(&server)
        .await;

    fabcheck_cmd()
        .args(["--controller", &server.uri(), "-o", "plain", "tenants", "list"])
        .assert()
        .success()
        .stdout("t1\nsystem\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tenant_delete_needs_yes_without_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mars/v1/tenants/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenants": [{"name": "t1", "type": "Normal"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mars/v1/tenants/v1/t1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let output = fabcheck_cmd()
        .args(["--controller", &server.uri(), "tenants", "delete", "t1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_tenant_delete_conflict_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mars/v1/tenants/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenants": [{"name": "t1", "type": "Normal"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/mars/v1/tenants/v1/t1"))
        .respond_with(ResponseTemplate::new(409).set_body_string("tenant t1 still has segments"))
        .expect(1)
        .mount(&server)
        .await;

    let output = fabcheck_cmd()
        .args(["--controller", &server.uri(), "-y", "tenants", "delete", "t1"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sflow_show_missing_device_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mars/sflow/v1/of:0000000000000011"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = fabcheck_cmd()
        .args(["--controller", &server.uri(), "sflow", "show", "of:0000000000000011"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}
