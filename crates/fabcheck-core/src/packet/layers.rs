// ── Layer descriptors ──
//
// Typed, owned descriptions of the headers a test frame is assembled from.
// Fields left as `None` (ethertype, protocol, checksums) are filled in by
// the encoder from the surrounding layers.

use std::net::Ipv4Addr;

use bytes::Bytes;

use crate::model::MacAddress;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_ARP: u16 = 0x0806;
pub const ETHERTYPE_VLAN: u16 = 0x8100;
pub const ETHERTYPE_PPPOE_DISCOVERY: u16 = 0x8863;
pub const ETHERTYPE_LLDP: u16 = 0x88cc;

pub const IP_PROTO_ICMP: u8 = 1;
pub const IP_PROTO_TCP: u8 = 6;
pub const IP_PROTO_UDP: u8 = 17;

pub const DHCP_MAGIC_COOKIE: u32 = 0x6382_5363;

/// One header (or the trailing payload) of a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    Ethernet(Ethernet),
    Dot1Q(Dot1Q),
    Ipv4(Ipv4),
    Tcp(Tcp),
    Udp(Udp),
    Icmp(Icmp),
    Arp(Arp),
    Bootp(Bootp),
    Dhcp(Vec<DhcpOption>),
    PppoeDiscovery(PppoeDiscovery),
    Payload(Bytes),
}

impl Layer {
    /// Short lowercase name used as the prefix of field paths (`ipv4.ttl`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ethernet(_) => "ethernet",
            Self::Dot1Q(_) => "dot1q",
            Self::Ipv4(_) => "ipv4",
            Self::Tcp(_) => "tcp",
            Self::Udp(_) => "udp",
            Self::Icmp(_) => "icmp",
            Self::Arp(_) => "arp",
            Self::Bootp(_) => "bootp",
            Self::Dhcp(_) => "dhcp",
            Self::PppoeDiscovery(_) => "pppoe",
            Self::Payload(_) => "payload",
        }
    }
}

// ── L2 ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ethernet {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: Option<u16>,
}

impl Ethernet {
    pub fn new(dst: MacAddress, src: MacAddress) -> Self {
        Self {
            dst,
            src,
            ethertype: None,
        }
    }
}

/// 802.1Q tag. `vid` is 12 bits, `pcp` 3 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dot1Q {
    pub pcp: u8,
    pub cfi: bool,
    pub vid: u16,
    pub ethertype: Option<u16>,
}

impl Dot1Q {
    pub fn new(vid: u16) -> Self {
        Self {
            vid,
            ..Self::default()
        }
    }
}

// ARP for IPv4 over Ethernet only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arp {
    pub op: u16,
    pub sha: MacAddress,
    pub spa: Ipv4Addr,
    pub tha: MacAddress,
    pub tpa: Ipv4Addr,
}

impl Arp {
    pub const REQUEST: u16 = 1;
    pub const REPLY: u16 = 2;
}

// ── L3 ───────────────────────────────────────────────────────────────

/// IPv4 header without options (IHL is always 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4 {
    pub tos: u8,
    pub id: u16,
    /// Three flag bits; `0x02` is don't-fragment.
    pub flags: u8,
    pub frag_offset: u16,
    pub ttl: u8,
    pub protocol: Option<u8>,
    pub checksum: Option<u16>,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl Ipv4 {
    pub const FLAG_DF: u8 = 0x02;

    pub fn new(src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        Self {
            src,
            dst,
            ..Self::default()
        }
    }
}

impl Default for Ipv4 {
    fn default() -> Self {
        Self {
            tos: 0,
            id: 1,
            flags: 0,
            frag_offset: 0,
            ttl: 64,
            protocol: None,
            checksum: None,
            src: Ipv4Addr::new(127, 0, 0, 1),
            dst: Ipv4Addr::new(127, 0, 0, 1),
        }
    }
}

// ── L4 ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tcp {
    pub sport: u16,
    pub dport: u16,
    pub seq: u32,
    pub ack: u32,
    pub flags: u8,
    pub window: u16,
    pub checksum: Option<u16>,
    pub urgent: u16,
}

impl Tcp {
    pub const SYN: u8 = 0x02;
}

impl Default for Tcp {
    fn default() -> Self {
        Self {
            sport: 20,
            dport: 80,
            seq: 0,
            ack: 0,
            flags: Self::SYN,
            window: 8192,
            checksum: None,
            urgent: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Udp {
    pub sport: u16,
    pub dport: u16,
    pub checksum: Option<u16>,
}

impl Udp {
    pub fn new(sport: u16, dport: u16) -> Self {
        Self {
            sport,
            dport,
            checksum: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Icmp {
    pub icmp_type: u8,
    pub code: u8,
    pub id: u16,
    pub seq: u16,
    pub checksum: Option<u16>,
}

impl Icmp {
    pub const ECHO_REPLY: u8 = 0;
    pub const ECHO_REQUEST: u8 = 8;

    pub fn echo_request(id: u16, seq: u16) -> Self {
        Self {
            icmp_type: Self::ECHO_REQUEST,
            id,
            seq,
            ..Self::default()
        }
    }
}

// ── BOOTP / DHCP ─────────────────────────────────────────────────────

/// Fixed BOOTP header, including the DHCP magic cookie (240 bytes on the
/// wire). `sname` and `file` are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bootp {
    pub op: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: MacAddress,
}

impl Bootp {
    pub const REQUEST: u8 = 1;
    pub const REPLY: u8 = 2;
    pub const FLAG_BROADCAST: u16 = 0x8000;
    pub const LEN: usize = 240;
}

impl Default for Bootp {
    fn default() -> Self {
        Self {
            op: Self::REQUEST,
            hops: 0,
            xid: 0,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: MacAddress::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            1 => Self::Discover,
            2 => Self::Offer,
            3 => Self::Request,
            4 => Self::Decline,
            5 => Self::Ack,
            6 => Self::Nak,
            7 => Self::Release,
            8 => Self::Inform,
            _ => return None,
        })
    }
}

impl From<DhcpMessageType> for u8 {
    fn from(kind: DhcpMessageType) -> Self {
        match kind {
            DhcpMessageType::Discover => 1,
            DhcpMessageType::Offer => 2,
            DhcpMessageType::Request => 3,
            DhcpMessageType::Decline => 4,
            DhcpMessageType::Ack => 5,
            DhcpMessageType::Nak => 6,
            DhcpMessageType::Release => 7,
            DhcpMessageType::Inform => 8,
        }
    }
}

/// DHCP options in wire order. An `End` is appended when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOption {
    Pad,
    SubnetMask(Ipv4Addr),
    Router(Ipv4Addr),
    RequestedAddr(Ipv4Addr),
    LeaseTime(u32),
    MessageType(DhcpMessageType),
    ServerId(Ipv4Addr),
    ParamRequestList(Vec<u8>),
    Raw { code: u8, data: Bytes },
    End,
}

impl DhcpOption {
    pub const PAD: u8 = 0;
    pub const SUBNET_MASK: u8 = 1;
    pub const ROUTER: u8 = 3;
    pub const REQUESTED_ADDR: u8 = 50;
    pub const LEASE_TIME: u8 = 51;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const SERVER_ID: u8 = 54;
    pub const PARAM_REQUEST_LIST: u8 = 55;
    pub const END: u8 = 255;
}

// ── PPPoE discovery ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PppoeTag {
    pub tag_type: u16,
    pub value: Bytes,
}

impl PppoeTag {
    pub const SERVICE_NAME: u16 = 0x0101;
    pub const HOST_UNIQ: u16 = 0x0103;
    pub const VENDOR_SPECIFIC: u16 = 0x0105;
}

/// PPPoE discovery header (ver/type fixed at 1/1). Tags follow in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PppoeDiscovery {
    pub code: u8,
    pub session_id: u16,
    pub tags: Vec<PppoeTag>,
}

impl PppoeDiscovery {
    pub const PADI: u8 = 0x09;
    pub const PADO: u8 = 0x07;
    pub const PADR: u8 = 0x19;
    pub const PADS: u8 = 0x65;
    pub const PADT: u8 = 0xa7;
}
