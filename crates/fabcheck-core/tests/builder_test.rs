#![allow(clippy::unwrap_used)]
// Builder request paths, bodies and teardown order against a mocked
// controller.

use std::net::Ipv4Addr;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fabcheck_api::models::{IpProtocol, SegmentType, SpanDirection, SwitchportMode};
use fabcheck_api::{Credentials, FabricClient, TransportConfig};
use fabcheck_core::builder::{
    LogicalRouter, NetworkPort, PolicyRoute, Pppoeia, Span, StaticVlan, Tenant, UplinkSegment,
    UserAccount, Vlan,
};
use fabcheck_core::{CoreError, Destroy, Fabric, MacAddress, Port, Timing};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Fabric) {
    let server = MockServer::start().await;
    let client =
        FabricClient::new(&server.uri(), Credentials::None, &TransportConfig::default()).unwrap();
    (server, Fabric::from_client(client, Timing::fast()))
}

fn api(suffix: &str) -> String {
    format!("/mars/{suffix}")
}

fn ok() -> ResponseTemplate {
    ResponseTemplate::new(200)
}

async fn expect_once(server: &MockServer, verb: &str, suffix: &str) {
    Mock::given(method(verb))
        .and(path(api(suffix)))
        .respond_with(ok())
        .expect(1)
        .mount(server)
        .await;
}

/// `METHOD /path` for every request the server saw, in arrival order.
async fn request_log(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

fn er0() -> Ipv4Addr {
    Ipv4Addr::new(192, 168, 50, 120)
}

// ── Logical routers ─────────────────────────────────────────────────

#[tokio::test]
async fn tenant_router_pushes_nested_payload_and_deletes() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("tenantlogicalrouter/v1/tenants/t1")))
        .and(body_json(json!({
            "name": "r1",
            "interfaces": ["s1", "s2"],
            "nexthop_groups": [
                {"nexthop_group_name": "g1", "ip_addresses": ["192.168.50.120"]}
            ],
            "static_routes": [
                {"name": "sr1", "dst": "10.0.0.0", "prefix_len": 8, "nexthop_group": "g1"}
            ],
            "policy_routes": [{
                "name": "p1",
                "ingress_segments": ["s1"],
                "ingress_ports": ["of:11/46"],
                "action": "permit",
                "sequence_no": 10,
                "protocols": ["tcp"],
                "match_ip": "192.168.50.0/24",
                "nexthop": "192.168.50.120"
            }]
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "tenantlogicalrouter/v1/tenants/t1/r1").await;

    let handle = LogicalRouter::new("r1", "t1")
        .interfaces(["s1", "s2"])
        .nexthop_group("g1", [er0()])
        .static_route("sr1", Ipv4Addr::new(10, 0, 0, 0), 8, "g1")
        .policy_route(
            PolicyRoute::new("p1")
                .ingress_segments(["s1"])
                .ingress_ports(["of:11/46"])
                .sequence_no(10)
                .protocols([IpProtocol::Tcp])
                .match_ip("192.168.50.0/24".parse().unwrap())
                .nexthop(er0()),
        )
        .build(&fabric)
        .await
        .unwrap();
    assert_eq!(handle.tenant(), "t1");
    assert_eq!(handle.name(), "r1");

    handle.destroy(&fabric).await.unwrap();
    assert!(matches!(
        handle.destroy(&fabric).await,
        Err(CoreError::AlreadyDestroyed { .. })
    ));
}

#[tokio::test]
async fn system_router_lives_under_system_tenant() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("tenantlogicalrouter/v1/tenants/system")))
        .and(body_json(json!({
            "name": "system",
            "tenant_routers": ["t1/r1", "t2/r2"]
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "tenantlogicalrouter/v1/tenants/system/system").await;

    let handle = LogicalRouter::system("system")
        .tenant_routers(["t1/r1", "t2/r2"])
        .build(&fabric)
        .await
        .unwrap();
    assert_eq!(handle.tenant(), "system");
    handle.destroy(&fabric).await.unwrap();
}

#[tokio::test]
async fn bad_tenant_router_reference_sends_nothing() {
    let (server, fabric) = setup().await;

    let err = LogicalRouter::system("system")
        .tenant_routers(["r1"])
        .build(&fabric)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation { .. }), "{err}");
    assert!(request_log(&server).await.is_empty());
}

// ── SPAN ────────────────────────────────────────────────────────────

#[tokio::test]
async fn span_session_create_read_back_and_delete() {
    let (server, fabric) = setup().await;

    let session = json!({
        "session": 1,
        "src": {"device_id": "of:11", "port": 46, "direction": "rx"},
        "target": {"device_id": "of:11", "port": 48}
    });
    Mock::given(method("POST"))
        .and(path(api("span/v1/sessions")))
        .and(body_json(session.clone()))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("span/v1/sessions/1")))
        .respond_with(ok().set_body_json(session))
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "span/v1/sessions/1").await;

    let handle = Span::new(1)
        .source("of:11", 46, SpanDirection::Rx)
        .target("of:11", 48)
        .build(&fabric)
        .await
        .unwrap();
    assert_eq!(handle.session_id(), 1);
    assert!(handle.matches_stored(&fabric).await.unwrap());

    let stored = Span::session(&fabric, 1).await.unwrap();
    assert_eq!(stored.target.port, 48);

    handle.destroy(&fabric).await.unwrap();
}

// ── VLAN / static VLAN ──────────────────────────────────────────────

#[tokio::test]
async fn vlan_destroy_checks_the_device_is_gone() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("vlan/v1")))
        .and(body_json(json!({
            "device-id": "of:11",
            "vlans": [{"vlan": 10, "ip": "192.168.10.1", "mask": "255.255.255.0"}]
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "vlan/v1/of:11").await;
    Mock::given(method("GET"))
        .and(path(api("vlan/v1")))
        .respond_with(ok().set_body_json(json!({"devices": []})))
        .mount(&server)
        .await;

    let handle = Vlan::new("of:11")
        .vlan(10, Ipv4Addr::new(192, 168, 10, 1), Ipv4Addr::new(255, 255, 255, 0))
        .build(&fabric)
        .await
        .unwrap();
    handle.destroy(&fabric).await.unwrap();

    assert_eq!(
        request_log(&server).await,
        vec!["POST /mars/vlan/v1", "DELETE /mars/vlan/v1/of:11", "GET /mars/vlan/v1"]
    );
}

#[tokio::test]
async fn vlan_left_behind_after_delete_is_reported() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("vlan/v1")))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(api("vlan/v1/of:11")))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("vlan/v1")))
        .respond_with(ok().set_body_json(json!({"devices": [{
            "device-id": "of:11",
            "vlans": [{"vlan": 10, "ip": "192.168.10.1", "mask": "255.255.255.0"}]
        }]})))
        .mount(&server)
        .await;

    let handle = Vlan::new("of:11")
        .vlan(10, Ipv4Addr::new(192, 168, 10, 1), Ipv4Addr::new(255, 255, 255, 0))
        .build(&fabric)
        .await
        .unwrap();

    let err = handle.destroy(&fabric).await.unwrap_err();
    assert!(matches!(err, CoreError::StateChanged { .. }), "{err}");
    // A failed delete leaves the handle live for another attempt.
    assert!(!handle.is_destroyed());
}

#[tokio::test]
async fn unverified_vlan_deletes_skip_read_back() {
    let (server, fabric) = setup().await;

    expect_once(&server, "DELETE", "vlan/v1/of:12").await;
    expect_once(&server, "DELETE", "staticvlan/v1/of:12").await;

    Vlan::delete_unverified(&fabric, "of:12").await.unwrap();
    StaticVlan::delete_unverified(&fabric, "of:12").await.unwrap();

    assert_eq!(
        request_log(&server).await,
        vec!["DELETE /mars/vlan/v1/of:12", "DELETE /mars/staticvlan/v1/of:12"]
    );
}

#[tokio::test]
async fn static_vlan_push_and_delete() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("staticvlan/v1")))
        .and(body_json(json!({
            "device-id": "of:11",
            "ports": [{
                "port": 46,
                "native": 10,
                "mode": "hybrid",
                "vlans": ["10/untag", "20/tag"]
            }]
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "staticvlan/v1/of:11").await;

    let handle = StaticVlan::new("of:11")
        .port(46, 10, SwitchportMode::Hybrid, ["10/untag", "20/tag"])
        .build(&fabric)
        .await
        .unwrap();
    handle.destroy(&fabric).await.unwrap();
}

#[tokio::test]
async fn malformed_static_vlan_entry_sends_nothing() {
    let (server, fabric) = setup().await;

    let err = StaticVlan::new("of:11")
        .port(46, 10, SwitchportMode::Access, ["10/trunk"])
        .build(&fabric)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Validation { .. }), "{err}");
    assert!(request_log(&server).await.is_empty());
}

// ── User accounts ───────────────────────────────────────────────────

#[tokio::test]
async fn user_account_create_and_delete() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("useraccount/v1/info")))
        .and(body_json(json!({
            "user_name": "tester",
            "groups": ["admingroup"],
            "password": "s3cret"
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "useraccount/v1/info/tester").await;

    let handle = UserAccount::new("tester")
        .groups(["admingroup"])
        .password("s3cret".to_string().into())
        .build(&fabric)
        .await
        .unwrap();
    assert_eq!(handle.user_name(), "tester");
    handle.destroy(&fabric).await.unwrap();
}

// ── Tenant with uplink segment ──────────────────────────────────────

#[tokio::test]
async fn tenant_with_uplink_builds_and_tears_down_in_order() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("topology/v1/uplink-segments")))
        .and(body_json(json!({
            "segmentName": "u1",
            "device_id": "of:11",
            "vlan": 100,
            "ports": ["49/tag"],
            "gateway": "192.168.200.254",
            "gateway_mac": "00:00:00:00:00:01",
            "ip_address": "192.168.200.1/24"
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api("v1/tenants/v1/t1/segments/s1/network")))
        .and(body_json(json!({
            "name": "np1",
            "type": "network",
            "ip_addresses": ["192.168.200.2"],
            "uplink_segment": "u1"
        })))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    for (verb, suffix) in [
        ("POST", "v1/tenants/v1"),
        ("POST", "v1/tenants/v1/t1/segments"),
        ("DELETE", "v1/tenants/v1/t1/segments/s1"),
        ("DELETE", "v1/tenants/v1/t1/segments/s2"),
        ("DELETE", "v1/tenants/v1/t1"),
        ("DELETE", "topology/v1/uplink-segments/u1"),
    ] {
        Mock::given(method(verb))
            .and(path(api(suffix)))
            .respond_with(ok())
            .mount(&server)
            .await;
    }

    let uplink = UplinkSegment::new("u1")
        .device_id("of:11")
        .vlan(100)
        .ports([Port::new(49).tagged(true)])
        .gateway(Ipv4Addr::new(192, 168, 200, 254))
        .gateway_mac(MacAddress::new([0, 0, 0, 0, 0, 1]))
        .ip_address("192.168.200.1/24".parse().unwrap());
    let handle = Tenant::new("t1")
        .uplink_segment(uplink)
        .segment("s1", SegmentType::Vlan, [Ipv4Addr::new(10, 0, 1, 1)], 10)
        .segment("s2", SegmentType::Vlan, [Ipv4Addr::new(10, 0, 2, 1)], 20)
        .network_port(NetworkPort::new(
            "s1",
            "np1",
            [Ipv4Addr::new(192, 168, 200, 2)],
            "u1",
        ))
        .build(&fabric)
        .await
        .unwrap();
    assert_eq!(handle.segments(), vec!["s1", "s2"]);

    handle.destroy(&fabric).await.unwrap();

    assert_eq!(
        request_log(&server).await,
        vec![
            "POST /mars/v1/tenants/v1",
            "POST /mars/topology/v1/uplink-segments",
            "POST /mars/v1/tenants/v1/t1/segments",
            "POST /mars/v1/tenants/v1/t1/segments",
            "POST /mars/v1/tenants/v1/t1/segments/s1/network",
            "DELETE /mars/v1/tenants/v1/t1/segments/s2",
            "DELETE /mars/v1/tenants/v1/t1/segments/s1",
            "DELETE /mars/v1/tenants/v1/t1",
            "DELETE /mars/topology/v1/uplink-segments/u1",
        ]
    );
}

#[tokio::test]
async fn incomplete_uplink_segment_sends_nothing() {
    let (server, fabric) = setup().await;

    let err = UplinkSegment::new("u1")
        .device_id("of:11")
        .vlan(100)
        .build(&fabric)
        .await
        .unwrap_err();

    assert!(
        matches!(&err, CoreError::Validation { field, .. } if field == "uplink_segment.gateway"),
        "{err}"
    );
    assert!(request_log(&server).await.is_empty());
}

// ── PPPoE intermediate agent ────────────────────────────────────────

const DELEGATE: &str = "rest:192.168.40.176:80/2";

#[tokio::test]
async fn pppoeia_replace_enable_and_trim_then_destroy_disables() {
    let (server, fabric) = setup().await;

    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11/delegates")))
        .and(body_json(json!({"delegateDevices": [DELEGATE]})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11/delegates")))
        .and(body_json(json!({"delegateDevices": []})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11")))
        .and(body_json(json!({"status": "true"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11")))
        .and(body_json(json!({"status": "false"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    expect_once(&server, "DELETE", "pppoeia/v1/of:11/delegates/0").await;

    let handle = Pppoeia::new("of:11")
        .delegates([DELEGATE])
        .put_delegates(&fabric)
        .await
        .unwrap();
    handle.set_status(&fabric, true).await.unwrap();
    handle.delete_delegate(&fabric, 0).await.unwrap();
    handle.destroy(&fabric).await.unwrap();

    assert_eq!(
        request_log(&server).await,
        vec![
            "PUT /mars/pppoeia/v1/of:11/delegates",
            "PUT /mars/pppoeia/v1/of:11",
            "DELETE /mars/pppoeia/v1/of:11/delegates/0",
            "PUT /mars/pppoeia/v1/of:11/delegates",
            "PUT /mars/pppoeia/v1/of:11",
        ]
    );

    let after = handle.set_status(&fabric, true).await.unwrap_err();
    assert!(matches!(after, CoreError::AlreadyDestroyed { .. }));
}

#[tokio::test]
async fn pppoeia_destroy_leaves_status_alone_unless_enabled_here() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("pppoeia/v1/of:11/delegates")))
        .and(body_json(json!({"delegateDevices": [DELEGATE]})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11/delegates")))
        .and(body_json(json!({"delegateDevices": []})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    // Enabled and disabled again by the test body; teardown must not
    // send a second disable.
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11")))
        .and(body_json(json!({"status": "true"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(api("pppoeia/v1/of:11")))
        .and(body_json(json!({"status": "false"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;

    let handle = Pppoeia::new("of:11")
        .delegates([DELEGATE])
        .build(&fabric)
        .await
        .unwrap();
    handle.set_status(&fabric, true).await.unwrap();
    handle.set_status(&fabric, false).await.unwrap();
    handle.destroy(&fabric).await.unwrap();

    let log = request_log(&server).await;
    assert_eq!(log.len(), 4, "{log:?}");
    assert_eq!(log[3], "PUT /mars/pppoeia/v1/of:11/delegates");
}

#[tokio::test]
async fn pppoeia_status_read_from_overview() {
    let (server, fabric) = setup().await;

    Mock::given(method("POST"))
        .and(path(api("pppoeia/v1/of:11/delegates")))
        .respond_with(ok())
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("pppoeia/v1")))
        .respond_with(ok().set_body_json(json!({
            "delegateDevices": [DELEGATE],
            "devices": [
                {"deviceId": "of:11", "status": "true"},
                {"deviceId": "of:12", "status": "false"}
            ]
        })))
        .mount(&server)
        .await;

    let handle = Pppoeia::new("of:11")
        .delegates([DELEGATE])
        .build(&fabric)
        .await
        .unwrap();

    assert_eq!(handle.status(&fabric).await.unwrap(), Some(true));
    assert_eq!(handle.delegates(&fabric).await.unwrap(), vec![DELEGATE]);
}
