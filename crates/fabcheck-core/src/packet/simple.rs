// ── Simple frame builders ──
//
// Ready-made frames with the defaults the fabric test suites are written
// against. `PacketSpec` collects the knobs; the `simple_*` functions pick
// the relevant ones for each frame kind.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};

use super::PacketError;
use super::encode::build_packet_padded;
use super::layers::{
    Arp, Dot1Q, ETHERTYPE_LLDP, Ethernet, Icmp, Ipv4, Layer, PppoeDiscovery, PppoeTag, Tcp, Udp,
};
use crate::model::MacAddress;

pub const DEFAULT_ETH_DST: MacAddress = MacAddress::new([0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);
pub const DEFAULT_ETH_SRC: MacAddress = MacAddress::new([0x00, 0x06, 0x07, 0x08, 0x09, 0x0a]);
pub const DEFAULT_IP_SRC: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 1);
pub const DEFAULT_IP_DST: Ipv4Addr = Ipv4Addr::new(192, 168, 0, 2);

/// Broadband Forum enterprise number carried in the PPPoE IA tag.
pub const PPPOE_IA_ENTERPRISE: u32 = 3561;

/// Knobs shared by the simple frame builders.
///
/// VLAN fields only take effect with `dl_vlan_enable`; setting them
/// without it is reported as an error at build time rather than silently
/// producing an untagged frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSpec {
    pub pktlen: Option<usize>,
    pub eth_dst: MacAddress,
    pub eth_src: MacAddress,
    pub eth_type: Option<u16>,
    pub dl_vlan_enable: bool,
    pub vlan_vid: Option<u16>,
    pub vlan_pcp: Option<u8>,
    pub ip_src: Ipv4Addr,
    pub ip_dst: Ipv4Addr,
    pub ip_tos: u8,
    pub ip_ttl: u8,
    pub ip_id: u16,
    pub ip_flags: u8,
    pub sport: Option<u16>,
    pub dport: Option<u16>,
    pub tcp_flags: u8,
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub arp_op: u16,
    pub arp_hw_target: MacAddress,
    pub pppoe_tags: Vec<PppoeTag>,
}

impl Default for PacketSpec {
    fn default() -> Self {
        Self {
            pktlen: None,
            eth_dst: DEFAULT_ETH_DST,
            eth_src: DEFAULT_ETH_SRC,
            eth_type: None,
            dl_vlan_enable: false,
            vlan_vid: None,
            vlan_pcp: None,
            ip_src: DEFAULT_IP_SRC,
            ip_dst: DEFAULT_IP_DST,
            ip_tos: 0,
            ip_ttl: 64,
            ip_id: 1,
            ip_flags: 0,
            sport: None,
            dport: None,
            tcp_flags: Tcp::SYN,
            icmp_type: Icmp::ECHO_REQUEST,
            icmp_code: 0,
            arp_op: Arp::REQUEST,
            arp_hw_target: MacAddress::ZERO,
            pppoe_tags: Vec::new(),
        }
    }
}

impl PacketSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pktlen(mut self, len: usize) -> Self {
        self.pktlen = Some(len);
        self
    }

    pub fn eth_dst(mut self, mac: MacAddress) -> Self {
        self.eth_dst = mac;
        self
    }

    pub fn eth_src(mut self, mac: MacAddress) -> Self {
        self.eth_src = mac;
        self
    }

    pub fn eth_type(mut self, ethertype: u16) -> Self {
        self.eth_type = Some(ethertype);
        self
    }

    pub fn dl_vlan_enable(mut self, enable: bool) -> Self {
        self.dl_vlan_enable = enable;
        self
    }

    pub fn vlan_vid(mut self, vid: u16) -> Self {
        self.vlan_vid = Some(vid);
        self
    }

    pub fn vlan_pcp(mut self, pcp: u8) -> Self {
        self.vlan_pcp = Some(pcp);
        self
    }

    /// Enable tagging with `vid`.
    pub fn vlan(self, vid: u16) -> Self {
        self.dl_vlan_enable(true).vlan_vid(vid)
    }

    pub fn pcp(self, pcp: u8) -> Self {
        self.vlan_pcp(pcp)
    }

    pub fn ip_src(mut self, ip: Ipv4Addr) -> Self {
        self.ip_src = ip;
        self
    }

    pub fn ip_dst(mut self, ip: Ipv4Addr) -> Self {
        self.ip_dst = ip;
        self
    }

    pub fn ip_tos(mut self, tos: u8) -> Self {
        self.ip_tos = tos;
        self
    }

    pub fn ip_ttl(mut self, ttl: u8) -> Self {
        self.ip_ttl = ttl;
        self
    }

    pub fn ip_id(mut self, id: u16) -> Self {
        self.ip_id = id;
        self
    }

    pub fn ip_flags(mut self, flags: u8) -> Self {
        self.ip_flags = flags;
        self
    }

    pub fn sport(mut self, port: u16) -> Self {
        self.sport = Some(port);
        self
    }

    pub fn dport(mut self, port: u16) -> Self {
        self.dport = Some(port);
        self
    }

    pub fn tcp_flags(mut self, flags: u8) -> Self {
        self.tcp_flags = flags;
        self
    }

    pub fn icmp(mut self, icmp_type: u8, code: u8) -> Self {
        self.icmp_type = icmp_type;
        self.icmp_code = code;
        self
    }

    pub fn arp_op(mut self, op: u16) -> Self {
        self.arp_op = op;
        self
    }

    pub fn arp_hw_target(mut self, mac: MacAddress) -> Self {
        self.arp_hw_target = mac;
        self
    }

    pub fn pppoe_tag(mut self, tag: PppoeTag) -> Self {
        self.pppoe_tags.push(tag);
        self
    }

    pub fn build_tcp(&self) -> Result<Bytes, PacketError> {
        simple_tcp_packet(self)
    }

    pub fn build_udp(&self) -> Result<Bytes, PacketError> {
        simple_udp_packet(self)
    }

    pub fn build_icmp(&self) -> Result<Bytes, PacketError> {
        simple_icmp_packet(self)
    }

    pub fn build_eth(&self) -> Result<Bytes, PacketError> {
        simple_eth_packet(self)
    }

    pub fn build_arp(&self) -> Result<Bytes, PacketError> {
        simple_arp_packet(self)
    }

    pub fn build_pppoe_discovery(&self) -> Result<Bytes, PacketError> {
        simple_pppoe_discovery_packet(self)
    }

    /// Ethernet header plus the optional 802.1Q tag.
    fn l2(&self, inner_type: Option<u16>) -> Result<Vec<Layer>, PacketError> {
        if !self.dl_vlan_enable {
            if self.vlan_vid.is_some() {
                return Err(PacketError::Field {
                    field: "vlan_vid",
                    reason: "set without dl_vlan_enable".into(),
                });
            }
            if self.vlan_pcp.is_some() {
                return Err(PacketError::Field {
                    field: "vlan_pcp",
                    reason: "set without dl_vlan_enable".into(),
                });
            }
            return Ok(vec![Layer::Ethernet(Ethernet {
                dst: self.eth_dst,
                src: self.eth_src,
                ethertype: inner_type,
            })]);
        }

        Ok(vec![
            Layer::Ethernet(Ethernet::new(self.eth_dst, self.eth_src)),
            Layer::Dot1Q(Dot1Q {
                pcp: self.vlan_pcp.unwrap_or(0),
                cfi: false,
                vid: self.vlan_vid.unwrap_or(0),
                ethertype: inner_type,
            }),
        ])
    }

    fn ipv4(&self) -> Ipv4 {
        Ipv4 {
            tos: self.ip_tos,
            id: self.ip_id,
            flags: self.ip_flags,
            ttl: self.ip_ttl,
            ..Ipv4::new(self.ip_src, self.ip_dst)
        }
    }
}

/// TCP SYN, 1234 -> 80, padded to 100 bytes.
pub fn simple_tcp_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let mut layers = spec.l2(None)?;
    layers.push(Layer::Ipv4(spec.ipv4()));
    layers.push(Layer::Tcp(Tcp {
        sport: spec.sport.unwrap_or(1234),
        dport: spec.dport.unwrap_or(80),
        flags: spec.tcp_flags,
        ..Tcp::default()
    }));
    build_packet_padded(&layers, spec.pktlen.unwrap_or(100))
}

/// UDP 1234 -> 80, padded to 100 bytes.
pub fn simple_udp_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let mut layers = spec.l2(None)?;
    layers.push(Layer::Ipv4(spec.ipv4()));
    layers.push(Layer::Udp(Udp::new(
        spec.sport.unwrap_or(1234),
        spec.dport.unwrap_or(80),
    )));
    build_packet_padded(&layers, spec.pktlen.unwrap_or(100))
}

/// ICMP echo request (by default), padded to 60 bytes.
pub fn simple_icmp_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let mut layers = spec.l2(None)?;
    layers.push(Layer::Ipv4(spec.ipv4()));
    layers.push(Layer::Icmp(Icmp {
        icmp_type: spec.icmp_type,
        code: spec.icmp_code,
        ..Icmp::default()
    }));
    build_packet_padded(&layers, spec.pktlen.unwrap_or(60))
}

/// Bare Ethernet frame, ethertype 0x88cc unless overridden, padded to 60
/// bytes.
pub fn simple_eth_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let layers = spec.l2(Some(spec.eth_type.unwrap_or(ETHERTYPE_LLDP)))?;
    build_packet_padded(&layers, spec.pktlen.unwrap_or(60))
}

/// ARP request from `eth_src`/`ip_src` for `ip_dst`, broadcast unless
/// `eth_dst` was changed, padded to 60 bytes.
pub fn simple_arp_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let mut spec = spec.clone();
    if spec.eth_dst == DEFAULT_ETH_DST {
        spec.eth_dst = MacAddress::BROADCAST;
    }
    let mut layers = spec.l2(None)?;
    layers.push(Layer::Arp(Arp {
        op: spec.arp_op,
        sha: spec.eth_src,
        spa: spec.ip_src,
        tha: spec.arp_hw_target,
        tpa: spec.ip_dst,
    }));
    build_packet_padded(&layers, spec.pktlen.unwrap_or(60))
}

/// PADI with an empty Service-Name and a Host-Uniq tag unless tags were
/// supplied, broadcast unless `eth_dst` was changed, padded to 60 bytes.
pub fn simple_pppoe_discovery_packet(spec: &PacketSpec) -> Result<Bytes, PacketError> {
    let mut spec = spec.clone();
    if spec.eth_dst == DEFAULT_ETH_DST {
        spec.eth_dst = MacAddress::BROADCAST;
    }
    let tags = if spec.pppoe_tags.is_empty() {
        vec![
            PppoeTag {
                tag_type: PppoeTag::SERVICE_NAME,
                value: Bytes::new(),
            },
            PppoeTag {
                tag_type: PppoeTag::HOST_UNIQ,
                value: Bytes::from_static(&[0x25, 0x1d, 0x00, 0x00]),
            },
        ]
    } else {
        spec.pppoe_tags.clone()
    };
    let mut layers = spec.l2(None)?;
    layers.push(Layer::PppoeDiscovery(PppoeDiscovery {
        code: PppoeDiscovery::PADI,
        session_id: 0,
        tags,
    }));
    build_packet_padded(&layers, spec.pktlen.unwrap_or(60))
}

/// Vendor-specific tag an intermediate agent inserts: enterprise 3561
/// followed by circuit-id (sub-option 1) and remote-id (sub-option 2).
/// Empty ids are omitted.
pub fn pppoe_ia_tag(circuit_id: &str, remote_id: &str) -> PppoeTag {
    let mut value = BytesMut::new();
    value.put_u32(PPPOE_IA_ENTERPRISE);
    for (code, id) in [(0x01u8, circuit_id), (0x02u8, remote_id)] {
        if id.is_empty() {
            continue;
        }
        let len = u8::try_from(id.len()).unwrap_or(u8::MAX);
        value.put_u8(code);
        value.put_u8(len);
        value.put_slice(&id.as_bytes()[..usize::from(len)]);
    }
    PppoeTag {
        tag_type: PppoeTag::VENDOR_SPECIFIC,
        value: value.freeze(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::packet::parse_packet;
    use pretty_assertions::assert_eq;

    #[test]
    fn tcp_defaults() {
        let frame = simple_tcp_packet(&PacketSpec::new()).unwrap();
        assert_eq!(frame.len(), 100);
        assert_eq!(&frame[..6], &DEFAULT_ETH_DST.octets());
        assert_eq!(&frame[6..12], &DEFAULT_ETH_SRC.octets());

        let parsed = parse_packet(&frame).unwrap();
        assert_eq!(
            parsed.layer_names(),
            vec!["ethernet", "ipv4", "tcp", "payload"]
        );
        let ip = parsed.ipv4().unwrap();
        assert_eq!(ip.ttl, 64);
        assert_eq!(ip.src, DEFAULT_IP_SRC);
        assert!(frame[54..].iter().all(|b| *b == b'D'));
    }

    #[test]
    fn vlan_without_enable_fails_fast() {
        let err = simple_tcp_packet(&PacketSpec::new().vlan_vid(10)).unwrap_err();
        assert!(matches!(err, PacketError::Field { field: "vlan_vid", .. }));
    }

    #[test]
    fn tagged_frame_keeps_pktlen() {
        let frame = PacketSpec::new().vlan(10).pcp(2).build_udp().unwrap();
        assert_eq!(frame.len(), 100);
        assert_eq!(&frame[12..16], &[0x81, 0x00, 0x40, 0x0a]);
    }

    #[test]
    fn eth_defaults_to_lldp_type() {
        let frame = PacketSpec::new().build_eth().unwrap();
        assert_eq!(frame.len(), 60);
        assert_eq!(&frame[12..14], &[0x88, 0xcc]);
    }

    #[test]
    fn arp_request_is_broadcast() {
        let frame = PacketSpec::new().build_arp().unwrap();
        let parsed = parse_packet(&frame).unwrap();
        assert!(parsed.ethernet().unwrap().dst.is_broadcast());
        assert_eq!(parsed.arp().unwrap().op, Arp::REQUEST);
    }

    #[test]
    fn pppoe_discovery_default_tags() {
        let frame = PacketSpec::new().build_pppoe_discovery().unwrap();
        assert_eq!(frame.len(), 60);
        assert_eq!(&frame[12..14], &[0x88, 0x63]);
        assert_eq!(
            &frame[14..32],
            &[
                0x11, 0x09, 0, 0, 0, 12, 0x01, 0x01, 0, 0, 0x01, 0x03, 0, 4, 0x25, 0x1d, 0, 0
            ]
        );
    }

    #[test]
    fn ia_tag_layout() {
        let tag = pppoe_ia_tag("port1", "");
        assert_eq!(tag.tag_type, 0x0105);
        assert_eq!(
            tag.value.as_ref(),
            &[0, 0, 0x0d, 0xe9, 0x01, 5, b'p', b'o', b'r', b't', b'1']
        );
    }
}
