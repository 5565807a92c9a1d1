// Fabric controller request/response schemas
//
// One struct per payload the controller accepts or returns. Request types
// serialize exactly the keys the controller expects (mixed snake_case,
// camelCase and kebab-case depending on the resource); response types use
// `#[serde(default)]` liberally because controller builds differ in which
// optional fields they echo back.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Tenants ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
pub enum TenantKind {
    #[default]
    Normal,
    System,
}

/// `POST v1/tenants/v1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TenantKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<TenantKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantList {
    #[serde(default)]
    pub tenants: Vec<TenantRecord>,
}

// ── Segments ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SegmentType {
    Vlan,
    Vxlan,
}

/// `POST v1/tenants/v1/{tenant}/segments`
///
/// `value` is the VLAN id or VXLAN VNI, depending on `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub segment_type: SegmentType,
    pub ip_address: Vec<Ipv4Addr>,
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord {
    #[serde(alias = "name")]
    pub segment_name: String,
    #[serde(default)]
    pub tenant_name: Option<String>,
    #[serde(rename = "type", default)]
    pub segment_type: Option<SegmentType>,
    #[serde(default)]
    pub ip_address: Vec<String>,
    #[serde(default)]
    pub value: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentList {
    #[serde(default)]
    pub segments: Vec<SegmentRecord>,
}

/// `POST v1/tenants/v1/{tenant}/segments/{segment}/device/{device}/vlan`
///
/// Port names carry the tagging mode: `"46/untag"`, `"49/tag"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMemberRequest {
    pub ports: Vec<String>,
}

/// `POST v1/tenants/v1/{tenant}/segments/{segment}/access`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPortRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    pub device_id: String,
    pub port: u32,
    pub vlan: u16,
}

/// `POST v1/tenants/v1/{tenant}/segments/{segment}/network`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkPortRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub port_type: String,
    pub ip_addresses: Vec<Ipv4Addr>,
    pub uplink_segment: String,
}

/// `POST topology/v1/uplink-segments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UplinkSegmentRequest {
    #[serde(rename = "segmentName")]
    pub name: String,
    pub device_id: String,
    pub vlan: u16,
    pub ports: Vec<String>,
    pub gateway: Ipv4Addr,
    pub gateway_mac: String,
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UplinkSegmentList {
    #[serde(default, rename = "uplinkSegments")]
    pub uplink_segments: Vec<UplinkSegmentRequest>,
}

// ── Logical routers ──────────────────────────────────────────────────

/// `POST tenantlogicalrouter/v1/tenants/{tenant}`
///
/// Nested nexthop groups, static routes and policy routes travel in the
/// same payload. A system router carries `tenant_routers` (`"t1/r1"`)
/// instead of interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouterRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interfaces: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tenant_routers: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nexthop_groups: Vec<NexthopGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub static_routes: Vec<StaticRoute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_routes: Vec<PolicyRouteSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NexthopGroup {
    pub nexthop_group_name: String,
    pub ip_addresses: Vec<Ipv4Addr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticRoute {
    pub name: String,
    pub dst: Ipv4Addr,
    pub prefix_len: u8,
    pub nexthop_group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PolicyAction {
    #[default]
    Permit,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum IpProtocol {
    Tcp,
    Udp,
    Icmp,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyRouteSpec {
    pub name: String,
    #[serde(default)]
    pub ingress_segments: Vec<String>,
    #[serde(default)]
    pub ingress_ports: Vec<String>,
    pub action: PolicyAction,
    pub sequence_no: u32,
    #[serde(default)]
    pub protocols: Vec<IpProtocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nexthop: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterRecord {
    pub name: String,
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub tenant_routers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterList {
    #[serde(default)]
    pub routers: Vec<RouterRecord>,
}

// ── DHCP relay ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpRelayServer {
    pub tenant: String,
    pub segment: String,
    pub servers: Vec<Ipv4Addr>,
}

/// `POST dhcprelay/v1` body and `GET dhcprelay/v1` response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DhcpRelayConfig {
    #[serde(rename = "dhcpRelayServers", default)]
    pub servers: Vec<DhcpRelayServer>,
}

// ── SPAN ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpanDirection {
    Rx,
    Tx,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSource {
    pub device_id: String,
    pub port: u32,
    pub direction: SpanDirection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanTarget {
    pub device_id: String,
    pub port: u32,
}

/// `POST span/v1/sessions`; `GET span/v1/sessions/{id}` echoes `src` and
/// `target` (the session id may be omitted on read).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanSession {
    #[serde(default)]
    pub session: u32,
    pub src: SpanSource,
    pub target: SpanTarget,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanList {
    #[serde(default)]
    pub sessions: Vec<SpanSession>,
}

// ── sFlow ────────────────────────────────────────────────────────────

/// `POST sflow/v1/{device}` (request keys are snake_case).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SflowRequest {
    pub collector_ip: Ipv4Addr,
    pub max_payload_length: u32,
    pub max_header_length: u32,
    pub polling_interval: u32,
    pub sample_rate: u32,
    pub port: Vec<u32>,
    pub duration: u32,
}

/// Stored sFlow configuration as reported by the controller (camelCase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SflowRecord {
    #[serde(default)]
    pub device_id: Option<String>,
    pub controller_ip: String,
    pub max_payload_length: u32,
    pub max_header_length: u32,
    pub polling_interval: u32,
    pub sampling_rate: u32,
    #[serde(default)]
    pub port: Vec<u32>,
    pub duration: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SflowList {
    #[serde(default)]
    pub sflows: Vec<SflowRecord>,
}

// ── PPPoE intermediate agent ─────────────────────────────────────────

/// `POST`/`PUT pppoeia/v1/{device}/delegates`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeiaDelegates {
    pub delegate_devices: Vec<String>,
}

/// `PUT pppoeia/v1/{device}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PppoeiaStatusRequest {
    #[serde(with = "string_bool")]
    pub status: bool,
}

/// `PUT pppoeia/v1/{device}/ports/{port}`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeiaPortRequest {
    #[serde(with = "string_bool")]
    pub host_port: bool,
    #[serde(with = "string_bool")]
    pub strip_vendor: bool,
    pub circuit_id: String,
    pub remote_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeiaDeviceStatus {
    pub device_id: String,
    #[serde(with = "string_bool")]
    pub status: bool,
}

/// `GET pppoeia/v1`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeiaOverview {
    #[serde(default)]
    pub delegate_devices: Vec<String>,
    #[serde(default)]
    pub devices: Vec<PppoeiaDeviceStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PppoeiaPortRecord {
    pub device_id: String,
    #[serde(default)]
    pub port: Option<u32>,
    #[serde(default)]
    pub circuit_id: String,
    #[serde(default)]
    pub remote_id: String,
    #[serde(default, with = "string_bool")]
    pub strip_vendor: bool,
    #[serde(default, with = "string_bool")]
    pub host_port: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PppoeiaPortList {
    #[serde(default)]
    pub ports: Vec<PppoeiaPortRecord>,
}

/// Per-device discovery counters. Counter names vary across switch
/// firmware, so everything beyond `deviceId` is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PppoeiaStats {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(flatten)]
    pub counters: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PppoeiaStatsList {
    #[serde(default)]
    pub statistics: Vec<PppoeiaStats>,
}

// ── VLAN / static VLAN ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanEntry {
    pub vlan: u16,
    pub ip: Ipv4Addr,
    pub mask: Ipv4Addr,
}

/// `POST vlan/v1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanConfig {
    #[serde(rename = "device-id")]
    pub device_id: String,
    #[serde(default)]
    pub vlans: Vec<VlanEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VlanList {
    #[serde(default)]
    pub devices: Vec<VlanConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SwitchportMode {
    Access,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticVlanPort {
    pub port: u32,
    pub native: u16,
    pub mode: SwitchportMode,
    /// Membership entries such as `"10/untag"` or `"20/tag"`.
    pub vlans: Vec<String>,
}

/// `POST staticvlan/v1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticVlanConfig {
    #[serde(rename = "device-id")]
    pub device_id: String,
    #[serde(default)]
    pub ports: Vec<StaticVlanPort>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticVlanList {
    #[serde(default)]
    pub devices: Vec<StaticVlanConfig>,
}

// ── User accounts ────────────────────────────────────────────────────

/// `POST useraccount/v1/info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccountRequest {
    pub user_name: String,
    pub groups: Vec<String>,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserList {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

/// `GET useraccount/v1/info/group/{group}` returns bare user names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupMembers {
    #[serde(default)]
    pub users: Vec<String>,
}

// ── Helpers ──────────────────────────────────────────────────────────

/// The controller accepts flags as `"true"`/`"false"` strings and echoes
/// them back as JSON booleans. Serialize as strings, accept either.
mod string_bool {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Text(String),
        }

        match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => Ok(b),
            Flag::Text(s) => match s.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(serde::de::Error::custom(format!("invalid flag {other:?}"))),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn segment_request_uses_controller_keys() {
        let req = SegmentRequest {
            name: "s1".into(),
            segment_type: SegmentType::Vlan,
            ip_address: vec![Ipv4Addr::new(192, 168, 50, 1)],
            value: 10,
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"name": "s1", "type": "vlan", "ip_address": ["192.168.50.1"], "value": 10})
        );
    }

    #[test]
    fn sflow_record_reads_camel_case() {
        let rec: SflowRecord = serde_json::from_value(json!({
            "controllerIp": "192.168.2.20",
            "maxPayloadLength": 1500,
            "maxHeaderLength": 64,
            "pollingInterval": 10,
            "samplingRate": 256,
            "duration": 30
        }))
        .unwrap();
        assert_eq!(rec.max_header_length, 64);
        assert_eq!(rec.sampling_rate, 256);
        assert!(rec.port.is_empty());
    }

    #[test]
    fn pppoeia_flags_round_trip_as_strings() {
        let req = PppoeiaPortRequest {
            host_port: true,
            strip_vendor: false,
            circuit_id: "port1".into(),
            remote_id: String::new(),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["hostPort"], json!("true"));
        assert_eq!(value["stripVendor"], json!("false"));

        let status: PppoeiaDeviceStatus =
            serde_json::from_value(json!({"deviceId": "of:1", "status": true})).unwrap();
        assert!(status.status);
    }

    #[test]
    fn router_request_omits_empty_sections() {
        let req = RouterRequest {
            name: "system".into(),
            tenant_routers: vec!["t1/r1".into(), "t2/r2".into()],
            ..RouterRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"name": "system", "tenant_routers": ["t1/r1", "t2/r2"]})
        );
    }

    #[test]
    fn tenant_kind_parses_from_str() {
        assert_eq!("System".parse::<TenantKind>().unwrap(), TenantKind::System);
        assert_eq!(SegmentType::Vxlan.to_string(), "vxlan");
    }
}
