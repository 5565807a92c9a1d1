//! Configuration for fabcheck.
//!
//! One TOML file holds the controller connection, timing knobs, and named
//! topology profiles describing test beds. Values layer as built-in
//! defaults, then the file, then `FABCHECK_*` environment variables
//! (`FABCHECK_CONTROLLER__URL`, `FABCHECK_TIMING__SETTLE`, ...).
//!
//! No credentials are built in. The password comes from the environment
//! variable named by `controller.password_env` or, failing that, from
//! plaintext in the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fabcheck_api::{Credentials, TlsMode};
use fabcheck_core::{Device, FabricConfig, Host, Timing, Topology, TopologyKind};

pub const DEFAULT_CONTROLLER_URL: &str = "http://127.0.0.1:8181/mars/";
pub const DEFAULT_PASSWORD_ENV: &str = "FABCHECK_PASSWORD";
pub const DEFAULT_PROFILE: &str = "default";
/// Overrides the OS hostname when choosing a profile.
pub const HOSTNAME_ENV: &str = "FABCHECK_HOSTNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for controller user '{username}'")]
    NoCredentials { username: String },

    #[error("unknown profile '{name}' (available: {available})")]
    UnknownProfile { name: String, available: String },

    #[error("profile '{name}' is not a valid topology: {reason}")]
    Topology { name: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub controller: ControllerSection,

    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControllerSection {
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic-auth user. Without one, requests are sent unauthenticated.
    pub username: Option<String>,

    /// Environment variable holding the password.
    #[serde(default = "default_password_env")]
    pub password_env: Option<String>,

    /// Plaintext password (prefer `password_env`).
    pub password: Option<String>,

    /// Request timeout, e.g. `"30s"`.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default)]
    pub insecure: bool,

    pub ca_cert: Option<PathBuf>,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password_env: default_password_env(),
            password: None,
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_url() -> String {
    DEFAULT_CONTROLLER_URL.into()
}
fn default_password_env() -> Option<String> {
    Some(DEFAULT_PASSWORD_ENV.into())
}
fn default_timeout() -> String {
    "30s".into()
}

/// Waits and verification windows as humantime strings (`"4s"`, `"3m"`,
/// `"10ms"`).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingSection {
    pub settle: String,
    pub post_reboot: String,
    pub verify_timeout: String,
    pub quiescence: String,
    pub poll_interval: String,
}

impl Default for TimingSection {
    fn default() -> Self {
        let t = Timing::default();
        Self {
            settle: format_duration(t.settle),
            post_reboot: format_duration(t.post_reboot),
            verify_timeout: format_duration(t.verify_timeout),
            quiescence: format_duration(t.quiescence),
            poll_interval: format_duration(t.poll_interval),
        }
    }
}

fn format_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value).map_err(|e| invalid(field, format!("'{value}': {e}")))
}

impl TimingSection {
    pub fn to_timing(&self) -> Result<Timing, ConfigError> {
        let timing = Timing {
            settle: parse_duration("timing.settle", &self.settle)?,
            post_reboot: parse_duration("timing.post_reboot", &self.post_reboot)?,
            verify_timeout: parse_duration("timing.verify_timeout", &self.verify_timeout)?,
            quiescence: parse_duration("timing.quiescence", &self.quiescence)?,
            poll_interval: parse_duration("timing.poll_interval", &self.poll_interval)?,
        };
        if timing.poll_interval.is_zero() {
            return Err(invalid("timing.poll_interval", "must be greater than zero"));
        }
        Ok(timing)
    }
}

/// A test bed: which switches, hosts and rig ports make up the fabric.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub kind: TopologyKind,
    #[serde(default)]
    pub spines: Vec<Device>,
    #[serde(default)]
    pub leaves: Vec<Device>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub external_routers: Vec<Host>,
    pub dhcp_server: Option<Host>,
    /// Logical dataplane port (as a string key) -> rig interface name.
    #[serde(default)]
    pub port_map: BTreeMap<String, String>,
}

impl Profile {
    pub fn to_topology(&self, name: &str) -> Result<Topology, ConfigError> {
        let mut port_map = BTreeMap::new();
        for (port, iface) in &self.port_map {
            let number: u32 = port.parse().map_err(|_| ConfigError::Topology {
                name: name.into(),
                reason: format!("port_map key '{port}' is not a port number"),
            })?;
            port_map.insert(number, iface.clone());
        }

        let topology = Topology {
            kind: self.kind,
            spines: self.spines.clone(),
            leaves: self.leaves.clone(),
            hosts: self.hosts.clone(),
            external_routers: self.external_routers.clone(),
            dhcp_server: self.dhcp_server.clone(),
            port_map,
        };
        topology.validate().map_err(|e| ConfigError::Topology {
            name: name.into(),
            reason: e.to_string(),
        })?;
        Ok(topology)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "fabcheck", "fabcheck").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("fabcheck");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Layered provider: defaults, then `path`, then `FABCHECK_<SECTION>__<KEY>`
/// env vars. Single-segment `FABCHECK_*` names belong to the CLI flags.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("FABCHECK_")
                .filter(|key| key.as_str().contains("__"))
                .split("__"),
        )
}

/// Load from `path`, or the platform config path when `None`. A missing
/// file is not an error; defaults and environment still apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);
    Ok(figment(&path).extract()?)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Resolution ──────────────────────────────────────────────────────

/// Name of the machine running the checks: `FABCHECK_HOSTNAME` when set,
/// otherwise the OS hostname.
pub fn runner_hostname() -> Option<String> {
    runner_hostname_with(
        |name| std::env::var(name).ok(),
        || gethostname::gethostname().into_string().ok(),
    )
}

fn runner_hostname_with(
    env: impl Fn(&str) -> Option<String>,
    os: impl FnOnce() -> Option<String>,
) -> Option<String> {
    env(HOSTNAME_ENV)
        .filter(|h| !h.is_empty())
        .or_else(os)
        .filter(|h| !h.is_empty())
}

impl Config {
    /// Pick a profile: the explicit name, then `default_profile`, then a
    /// profile named after `hostname`, then `"default"`.
    pub fn profile_name(
        &self,
        explicit: Option<&str>,
        hostname: Option<&str>,
    ) -> Result<String, ConfigError> {
        let chosen = explicit
            .or(self.default_profile.as_deref())
            .or_else(|| hostname.filter(|h| self.profiles.contains_key(*h)))
            .unwrap_or(DEFAULT_PROFILE);

        if self.profiles.contains_key(chosen) {
            Ok(chosen.to_owned())
        } else {
            Err(ConfigError::UnknownProfile {
                name: chosen.to_owned(),
                available: self.available_profiles(),
            })
        }
    }

    fn available_profiles(&self) -> String {
        if self.profiles.is_empty() {
            "none".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }

    /// Resolve and validate the selected profile's topology. The hostname
    /// fallback is [`runner_hostname`].
    pub fn topology(&self, explicit: Option<&str>) -> Result<(String, Topology), ConfigError> {
        self.topology_for_host(explicit, runner_hostname().as_deref())
    }

    /// [`Config::topology`] with an explicit hostname.
    pub fn topology_for_host(
        &self,
        explicit: Option<&str>,
        hostname: Option<&str>,
    ) -> Result<(String, Topology), ConfigError> {
        let name = self.profile_name(explicit, hostname)?;
        let topology = self
            .profiles
            .get(&name)
            .ok_or_else(|| ConfigError::UnknownProfile {
                name: name.clone(),
                available: self.available_profiles(),
            })?
            .to_topology(&name)?;
        Ok((name, topology))
    }

    /// Basic-auth credentials, reading the password env var from the
    /// process environment.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.credentials_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::credentials`] with an explicit env lookup.
    pub fn credentials_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Credentials, ConfigError> {
        let controller = &self.controller;
        let Some(username) = controller.username.clone() else {
            return Ok(Credentials::None);
        };

        let from_env = controller
            .password_env
            .as_deref()
            .and_then(|name| lookup(name))
            .filter(|pw| !pw.is_empty());
        let password = from_env
            .or_else(|| controller.password.clone())
            .ok_or_else(|| ConfigError::NoCredentials {
                username: username.clone(),
            })?;

        Ok(Credentials::basic(username, SecretString::from(password)))
    }

    pub fn tls_mode(&self) -> TlsMode {
        if self.controller.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ca) = &self.controller.ca_cert {
            TlsMode::CustomCa(ca.clone())
        } else {
            TlsMode::System
        }
    }

    pub fn timeout(&self) -> Result<Duration, ConfigError> {
        parse_duration("controller.timeout", &self.controller.timeout)
    }

    /// Everything `fabcheck_core::Fabric::connect` needs.
    pub fn fabric_config(&self) -> Result<FabricConfig, ConfigError> {
        let url: url::Url = self
            .controller
            .url
            .parse()
            .map_err(|_| {
                invalid(
                    "controller.url",
                    format!("invalid URL: {}", self.controller.url),
                )
            })?;
        Ok(FabricConfig {
            url: url.to_string(),
            credentials: self.credentials()?,
            tls: self.tls_mode(),
            timeout: self.timeout()?,
            timing: self.timing.to_timing()?,
        })
    }

    /// Copy safe to print: any plaintext password masked.
    pub fn redacted(&self) -> Self {
        let mut shown = self.clone();
        if shown.controller.password.is_some() {
            shown.controller.password = Some("********".into());
        }
        shown
    }

    /// TOML rendering of [`Config::redacted`].
    pub fn to_toml_redacted(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn with_profiles(names: &[&str]) -> Config {
        Config {
            profiles: names
                .iter()
                .map(|n| ((*n).to_owned(), Profile::default()))
                .collect(),
            ..Config::default()
        }
    }

    #[test]
    fn explicit_profile_wins() {
        let mut cfg = with_profiles(&["lab", "default", "bed7"]);
        cfg.default_profile = Some("default".into());
        assert_eq!(cfg.profile_name(Some("lab"), Some("bed7")).unwrap(), "lab");
    }

    #[test]
    fn default_profile_before_hostname() {
        let mut cfg = with_profiles(&["lab", "bed7"]);
        cfg.default_profile = Some("lab".into());
        assert_eq!(cfg.profile_name(None, Some("bed7")).unwrap(), "lab");
    }

    #[test]
    fn hostname_used_when_it_names_a_profile() {
        let cfg = with_profiles(&["default", "bed7"]);
        assert_eq!(cfg.profile_name(None, Some("bed7")).unwrap(), "bed7");
        assert_eq!(cfg.profile_name(None, Some("laptop")).unwrap(), "default");
    }

    #[test]
    fn hostname_env_overrides_os_name() {
        let env = |name: &str| (name == HOSTNAME_ENV).then(|| "bed7".to_owned());
        let host = runner_hostname_with(env, || Some("AutoTestMars".into()));
        assert_eq!(host.as_deref(), Some("bed7"));
    }

    #[test]
    fn os_hostname_used_without_override() {
        let host = runner_hostname_with(|_| Some(String::new()), || Some("AutoTestMars".into()));
        assert_eq!(host.as_deref(), Some("AutoTestMars"));
        assert_eq!(runner_hostname_with(|_| None, || None), None);
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = with_profiles(&["lab"]);
        let err = cfg.profile_name(Some("nope"), None).unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown profile 'nope' (available: lab)"
        );
    }

    #[test]
    fn password_env_beats_plaintext() {
        let mut cfg = Config::default();
        cfg.controller.username = Some("tester".into());
        cfg.controller.password = Some("from-file".into());

        let creds = cfg
            .credentials_with(|name| (name == DEFAULT_PASSWORD_ENV).then(|| "from-env".into()))
            .unwrap();
        assert_eq!(creds.username(), Some("tester"));

        let Credentials::Basic { password, .. } = creds else {
            panic!("expected basic credentials");
        };
        use secrecy::ExposeSecret;
        assert_eq!(password.expose_secret(), "from-env");
    }

    #[test]
    fn username_without_password_is_an_error() {
        let mut cfg = Config::default();
        cfg.controller.username = Some("tester".into());
        assert!(matches!(
            cfg.credentials_with(|_| None),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn no_username_means_no_auth() {
        let cfg = Config::default();
        assert!(matches!(cfg.credentials_with(|_| None).unwrap(), Credentials::None));
    }

    #[test]
    fn default_timing_round_trips() {
        assert_eq!(TimingSection::default().to_timing().unwrap(), Timing::default());
    }

    #[test]
    fn bad_duration_names_field() {
        let timing = TimingSection {
            settle: "soon".into(),
            ..TimingSection::default()
        };
        let err = timing.to_timing().unwrap_err();
        assert!(err.to_string().starts_with("invalid timing.settle"), "{err}");
    }

    #[test]
    fn redacted_output_hides_password() {
        let mut cfg = Config::default();
        cfg.controller.password = Some("hunter22".into());
        let shown = cfg.to_toml_redacted().unwrap();
        assert!(!shown.contains("hunter22"));
        assert!(shown.contains("********"));
    }
}
