// Structural frame decoding.
//
// The decoder is lenient: anything it does not understand, or any header
// that is cut short, becomes a trailing `Payload` layer. Only a frame too
// short for an Ethernet header is an error.

use std::fmt::Write as _;
use std::net::Ipv4Addr;

use bytes::{Buf, Bytes};

use super::PacketError;
use super::layers::{
    Arp, Bootp, DHCP_MAGIC_COOKIE, DhcpMessageType, DhcpOption, Dot1Q, ETHERTYPE_ARP,
    ETHERTYPE_IPV4, ETHERTYPE_PPPOE_DISCOVERY, ETHERTYPE_VLAN, Ethernet, IP_PROTO_ICMP,
    IP_PROTO_TCP, IP_PROTO_UDP, Icmp, Ipv4, Layer, PppoeDiscovery, PppoeTag, Tcp, Udp,
};
use crate::model::MacAddress;

/// A decoded layer and where it sits in the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLayer {
    pub layer: Layer,
    pub offset: usize,
    pub len: usize,
}

/// One named header field of a decoded frame.
///
/// `bits` narrows the field to part of a two-byte window starting at
/// `offset` (802.1Q PCP/VID, IPv4 flags/fragment offset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub path: String,
    pub value: String,
    pub offset: usize,
    pub len: usize,
    pub bits: Option<u16>,
}

/// Frame decoded back into layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPacket {
    pub layers: Vec<DecodedLayer>,
}

impl ParsedPacket {
    pub fn layer_names(&self) -> Vec<&'static str> {
        self.layers.iter().map(|l| l.layer.name()).collect()
    }

    /// First decoded layer matching `pred`.
    pub fn find<T>(&self, pred: impl Fn(&Layer) -> Option<&T>) -> Option<&T> {
        self.layers.iter().find_map(|l| pred(&l.layer))
    }

    pub fn ipv4(&self) -> Option<&Ipv4> {
        self.find(|l| match l {
            Layer::Ipv4(ip) => Some(ip),
            _ => None,
        })
    }

    pub fn ethernet(&self) -> Option<&Ethernet> {
        self.find(|l| match l {
            Layer::Ethernet(eth) => Some(eth),
            _ => None,
        })
    }

    pub fn arp(&self) -> Option<&Arp> {
        self.find(|l| match l {
            Layer::Arp(arp) => Some(arp),
            _ => None,
        })
    }

    pub fn bootp(&self) -> Option<&Bootp> {
        self.find(|l| match l {
            Layer::Bootp(b) => Some(b),
            _ => None,
        })
    }

    /// Every header field in wire order. Repeated layers are indexed
    /// (`dot1q`, `dot1q[1]`).
    pub fn fields(&self) -> Vec<Field> {
        let mut out = Vec::new();
        let mut seen: Vec<&'static str> = Vec::new();
        for decoded in &self.layers {
            let name = decoded.layer.name();
            let count = seen.iter().filter(|n| **n == name).count();
            seen.push(name);
            let prefix = if count == 0 {
                name.to_string()
            } else {
                format!("{name}[{count}]")
            };
            layer_fields(&prefix, decoded, &mut out);
        }
        out
    }
}

/// Decode a captured frame.
pub fn parse_packet(data: &[u8]) -> Result<ParsedPacket, PacketError> {
    if data.len() < 14 {
        return Err(PacketError::Truncated {
            layer: "ethernet",
            needed: 14,
            available: data.len(),
        });
    }

    let mut layers = Vec::new();
    let mut buf = data;
    let eth = Ethernet {
        dst: take_mac(&mut buf),
        src: take_mac(&mut buf),
        ethertype: Some(buf.get_u16()),
    };
    let mut next = Next::Ether(eth.ethertype.unwrap_or_default());
    layers.push(DecodedLayer {
        layer: Layer::Ethernet(eth),
        offset: 0,
        len: 14,
    });

    let mut offset = 14;
    // IPv4 total length bounds the L3 payload; the rest is link padding.
    let mut l3_end = data.len();

    loop {
        let rest = &data[offset..l3_end];
        let decoded = match next {
            Next::Ether(ETHERTYPE_VLAN) => decode_dot1q(rest),
            Next::Ether(ETHERTYPE_IPV4) => decode_ipv4(rest),
            Next::Ether(ETHERTYPE_ARP) => decode_arp(rest),
            Next::Ether(ETHERTYPE_PPPOE_DISCOVERY) => decode_pppoe(rest),
            Next::Ip(IP_PROTO_TCP) => decode_tcp(rest),
            Next::Ip(IP_PROTO_UDP) => decode_udp(rest),
            Next::Ip(IP_PROTO_ICMP) => decode_icmp(rest),
            Next::Bootp => decode_bootp(rest),
            Next::DhcpOptions => decode_dhcp_options(rest),
            _ => None,
        };

        let Some((layer, len, following)) = decoded else {
            break;
        };

        if matches!(layer, Layer::Ipv4(_)) {
            let total = usize::from(ip_total_len(rest));
            if total >= len && offset + total <= data.len() {
                l3_end = offset + total;
            }
        }

        layers.push(DecodedLayer { layer, offset, len });
        offset += len;
        next = following;
        if matches!(next, Next::Stop) {
            break;
        }
    }

    if offset < data.len() {
        layers.push(DecodedLayer {
            layer: Layer::Payload(Bytes::copy_from_slice(&data[offset..])),
            offset,
            len: data.len() - offset,
        });
    }

    Ok(ParsedPacket { layers })
}

// ── Layer decoders ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Next {
    Ether(u16),
    Ip(u8),
    Bootp,
    DhcpOptions,
    Stop,
}

type Decoded = Option<(Layer, usize, Next)>;

fn take_mac(buf: &mut &[u8]) -> MacAddress {
    let mut octets = [0u8; 6];
    buf.copy_to_slice(&mut octets);
    MacAddress::new(octets)
}

fn take_ipv4(buf: &mut &[u8]) -> Ipv4Addr {
    Ipv4Addr::from(buf.get_u32())
}

fn ip_total_len(header: &[u8]) -> u16 {
    u16::from_be_bytes([header[2], header[3]])
}

fn decode_dot1q(mut buf: &[u8]) -> Decoded {
    if buf.len() < 4 {
        return None;
    }
    let tci = buf.get_u16();
    let ethertype = buf.get_u16();
    let tag = Dot1Q {
        pcp: u8::try_from(tci >> 13).unwrap_or_default(),
        cfi: tci & 0x1000 != 0,
        vid: tci & 0x0fff,
        ethertype: Some(ethertype),
    };
    Some((Layer::Dot1Q(tag), 4, Next::Ether(ethertype)))
}

fn decode_arp(mut buf: &[u8]) -> Decoded {
    if buf.len() < 28 {
        return None;
    }
    let htype = buf.get_u16();
    let ptype = buf.get_u16();
    let hlen = buf.get_u8();
    let plen = buf.get_u8();
    if htype != 1 || ptype != ETHERTYPE_IPV4 || hlen != 6 || plen != 4 {
        return None;
    }
    let op = buf.get_u16();
    let arp = Arp {
        op,
        sha: take_mac(&mut buf),
        spa: take_ipv4(&mut buf),
        tha: take_mac(&mut buf),
        tpa: take_ipv4(&mut buf),
    };
    Some((Layer::Arp(arp), 28, Next::Stop))
}

fn decode_ipv4(mut buf: &[u8]) -> Decoded {
    if buf.len() < 20 {
        return None;
    }
    let available = buf.len();
    let ver_ihl = buf.get_u8();
    let ihl = usize::from(ver_ihl & 0x0f) * 4;
    if ver_ihl >> 4 != 4 || ihl < 20 || ihl > available {
        return None;
    }
    let tos = buf.get_u8();
    let _total_len = buf.get_u16();
    let id = buf.get_u16();
    let flags_frag = buf.get_u16();
    let ttl = buf.get_u8();
    let protocol = buf.get_u8();
    let checksum = buf.get_u16();
    let ip = Ipv4 {
        tos,
        id,
        flags: u8::try_from(flags_frag >> 13).unwrap_or_default(),
        frag_offset: flags_frag & 0x1fff,
        ttl,
        protocol: Some(protocol),
        checksum: Some(checksum),
        src: take_ipv4(&mut buf),
        dst: take_ipv4(&mut buf),
    };
    // Later fragments carry no L4 header.
    let next = if ip.frag_offset == 0 {
        Next::Ip(protocol)
    } else {
        Next::Stop
    };
    Some((Layer::Ipv4(ip), ihl, next))
}

fn decode_tcp(mut buf: &[u8]) -> Decoded {
    if buf.len() < 20 {
        return None;
    }
    let sport = buf.get_u16();
    let dport = buf.get_u16();
    let seq = buf.get_u32();
    let ack = buf.get_u32();
    let data_offset = usize::from(buf.get_u8() >> 4) * 4;
    let flags = buf.get_u8();
    let window = buf.get_u16();
    let checksum = buf.get_u16();
    let urgent = buf.get_u16();
    let len = data_offset.clamp(20, 20 + buf.len());
    let tcp = Tcp {
        sport,
        dport,
        seq,
        ack,
        flags,
        window,
        checksum: Some(checksum),
        urgent,
    };
    Some((Layer::Tcp(tcp), len, Next::Stop))
}

fn decode_udp(mut buf: &[u8]) -> Decoded {
    if buf.len() < 8 {
        return None;
    }
    let sport = buf.get_u16();
    let dport = buf.get_u16();
    let _len = buf.get_u16();
    let checksum = buf.get_u16();
    let is_bootp = [sport, dport].iter().all(|p| *p == 67 || *p == 68)
        && buf.len() >= Bootp::LEN
        && buf[236..240] == DHCP_MAGIC_COOKIE.to_be_bytes();
    let udp = Udp {
        sport,
        dport,
        checksum: Some(checksum),
    };
    let next = if is_bootp { Next::Bootp } else { Next::Stop };
    Some((Layer::Udp(udp), 8, next))
}

fn decode_icmp(mut buf: &[u8]) -> Decoded {
    if buf.len() < 8 {
        return None;
    }
    let icmp = Icmp {
        icmp_type: buf.get_u8(),
        code: buf.get_u8(),
        checksum: Some(buf.get_u16()),
        id: buf.get_u16(),
        seq: buf.get_u16(),
    };
    Some((Layer::Icmp(icmp), 8, Next::Stop))
}

fn decode_bootp(mut buf: &[u8]) -> Decoded {
    if buf.len() < Bootp::LEN {
        return None;
    }
    let op = buf.get_u8();
    let _htype = buf.get_u8();
    let _hlen = buf.get_u8();
    let hops = buf.get_u8();
    let xid = buf.get_u32();
    let secs = buf.get_u16();
    let flags = buf.get_u16();
    let ciaddr = take_ipv4(&mut buf);
    let yiaddr = take_ipv4(&mut buf);
    let siaddr = take_ipv4(&mut buf);
    let giaddr = take_ipv4(&mut buf);
    let chaddr = take_mac(&mut buf);
    let bootp = Bootp {
        op,
        hops,
        xid,
        secs,
        flags,
        ciaddr,
        yiaddr,
        siaddr,
        giaddr,
        chaddr,
    };
    Some((Layer::Bootp(bootp), Bootp::LEN, Next::DhcpOptions))
}

fn decode_dhcp_options(data: &[u8]) -> Decoded {
    if data.is_empty() {
        return None;
    }
    let mut options = Vec::new();
    let mut pos = 0;
    while pos < data.len() {
        let code = data[pos];
        pos += 1;
        match code {
            DhcpOption::PAD => options.push(DhcpOption::Pad),
            DhcpOption::END => {
                options.push(DhcpOption::End);
                break;
            }
            _ => {
                let Some(&len) = data.get(pos) else { break };
                let len = usize::from(len);
                let Some(value) = data.get(pos + 1..pos + 1 + len) else {
                    break;
                };
                pos += 1 + len;
                options.push(decode_dhcp_option(code, value));
            }
        }
    }
    Some((Layer::Dhcp(options), pos, Next::Stop))
}

fn decode_dhcp_option(code: u8, value: &[u8]) -> DhcpOption {
    let addr = || <[u8; 4]>::try_from(value).ok().map(Ipv4Addr::from);
    let decoded = match code {
        DhcpOption::SUBNET_MASK => addr().map(DhcpOption::SubnetMask),
        DhcpOption::ROUTER => addr().map(DhcpOption::Router),
        DhcpOption::REQUESTED_ADDR => addr().map(DhcpOption::RequestedAddr),
        DhcpOption::SERVER_ID => addr().map(DhcpOption::ServerId),
        DhcpOption::LEASE_TIME => <[u8; 4]>::try_from(value)
            .ok()
            .map(|b| DhcpOption::LeaseTime(u32::from_be_bytes(b))),
        DhcpOption::MESSAGE_TYPE => match value {
            [kind] => DhcpMessageType::from_u8(*kind).map(DhcpOption::MessageType),
            _ => None,
        },
        DhcpOption::PARAM_REQUEST_LIST => Some(DhcpOption::ParamRequestList(value.to_vec())),
        _ => None,
    };
    decoded.unwrap_or_else(|| DhcpOption::Raw {
        code,
        data: Bytes::copy_from_slice(value),
    })
}

fn decode_pppoe(mut buf: &[u8]) -> Decoded {
    if buf.len() < 6 {
        return None;
    }
    let _ver_type = buf.get_u8();
    let code = buf.get_u8();
    let session_id = buf.get_u16();
    let len = usize::from(buf.get_u16()).min(buf.len());
    let mut tags_buf = &buf[..len];
    let mut tags = Vec::new();
    while tags_buf.len() >= 4 {
        let tag_type = tags_buf.get_u16();
        let tag_len = usize::from(tags_buf.get_u16());
        if tag_len > tags_buf.len() {
            break;
        }
        tags.push(PppoeTag {
            tag_type,
            value: Bytes::copy_from_slice(&tags_buf[..tag_len]),
        });
        tags_buf.advance(tag_len);
    }
    let consumed = 6 + len - tags_buf.len();
    let pppoe = PppoeDiscovery {
        code,
        session_id,
        tags,
    };
    Some((Layer::PppoeDiscovery(pppoe), consumed, Next::Stop))
}

// ── Field enumeration ────────────────────────────────────────────────

struct FieldSink<'a> {
    prefix: &'a str,
    base: usize,
    out: &'a mut Vec<Field>,
}

impl FieldSink<'_> {
    fn push(&mut self, name: &str, value: impl ToString, offset: usize, len: usize) {
        self.out.push(Field {
            path: format!("{}.{name}", self.prefix),
            value: value.to_string(),
            offset: self.base + offset,
            len,
            bits: None,
        });
    }

    fn push_bits(&mut self, name: &str, value: impl ToString, offset: usize, bits: u16) {
        self.out.push(Field {
            path: format!("{}.{name}", self.prefix),
            value: value.to_string(),
            offset: self.base + offset,
            len: 2,
            bits: Some(bits),
        });
    }
}

fn hex16(v: Option<u16>) -> String {
    v.map_or_else(|| "-".into(), |v| format!("{v:#06x}"))
}

fn short_hex(data: &[u8]) -> String {
    let mut s = String::new();
    for b in data.iter().take(16) {
        let _ = write!(s, "{b:02x}");
    }
    if data.len() > 16 {
        s.push_str("...");
    }
    s
}

fn layer_fields(prefix: &str, decoded: &DecodedLayer, out: &mut Vec<Field>) {
    let mut f = FieldSink {
        prefix,
        base: decoded.offset,
        out,
    };

    match &decoded.layer {
        Layer::Ethernet(eth) => {
            f.push("dst", eth.dst, 0, 6);
            f.push("src", eth.src, 6, 6);
            f.push("type", hex16(eth.ethertype), 12, 2);
        }
        Layer::Dot1Q(tag) => {
            f.push_bits("pcp", tag.pcp, 0, 0xe000);
            f.push_bits("cfi", tag.cfi, 0, 0x1000);
            f.push_bits("vid", tag.vid, 0, 0x0fff);
            f.push("type", hex16(tag.ethertype), 2, 2);
        }
        Layer::Ipv4(ip) => {
            f.push("tos", ip.tos, 1, 1);
            f.push("len", "", 2, 2);
            f.push("id", ip.id, 4, 2);
            f.push_bits("flags", format!("{:#x}", ip.flags), 6, 0xe000);
            f.push_bits("frag", ip.frag_offset, 6, 0x1fff);
            f.push("ttl", ip.ttl, 8, 1);
            f.push("proto", ip.protocol.unwrap_or_default(), 9, 1);
            f.push("checksum", hex16(ip.checksum), 10, 2);
            f.push("src", ip.src, 12, 4);
            f.push("dst", ip.dst, 16, 4);
        }
        Layer::Tcp(tcp) => {
            f.push("sport", tcp.sport, 0, 2);
            f.push("dport", tcp.dport, 2, 2);
            f.push("seq", tcp.seq, 4, 4);
            f.push("ack", tcp.ack, 8, 4);
            f.push("flags", format!("{:#04x}", tcp.flags), 13, 1);
            f.push("window", tcp.window, 14, 2);
            f.push("checksum", hex16(tcp.checksum), 16, 2);
        }
        Layer::Udp(udp) => {
            f.push("sport", udp.sport, 0, 2);
            f.push("dport", udp.dport, 2, 2);
            f.push("len", "", 4, 2);
            f.push("checksum", hex16(udp.checksum), 6, 2);
        }
        Layer::Icmp(icmp) => {
            f.push("type", icmp.icmp_type, 0, 1);
            f.push("code", icmp.code, 1, 1);
            f.push("checksum", hex16(icmp.checksum), 2, 2);
            f.push("id", icmp.id, 4, 2);
            f.push("seq", icmp.seq, 6, 2);
        }
        Layer::Arp(arp) => {
            f.push("op", arp.op, 6, 2);
            f.push("hwsrc", arp.sha, 8, 6);
            f.push("psrc", arp.spa, 14, 4);
            f.push("hwdst", arp.tha, 18, 6);
            f.push("pdst", arp.tpa, 24, 4);
        }
        Layer::Bootp(b) => {
            f.push("op", b.op, 0, 1);
            f.push("hops", b.hops, 3, 1);
            f.push("xid", b.xid, 4, 4);
            f.push("secs", b.secs, 8, 2);
            f.push("flags", format!("{:#06x}", b.flags), 10, 2);
            f.push("ciaddr", b.ciaddr, 12, 4);
            f.push("yiaddr", b.yiaddr, 16, 4);
            f.push("siaddr", b.siaddr, 20, 4);
            f.push("giaddr", b.giaddr, 24, 4);
            f.push("chaddr", b.chaddr, 28, 6);
        }
        Layer::Dhcp(options) => {
            f.push("options", format!("{options:?}"), 0, decoded.len);
        }
        Layer::PppoeDiscovery(p) => {
            f.push("code", format!("{:#04x}", p.code), 1, 1);
            f.push("session_id", p.session_id, 2, 2);
            f.push("len", "", 4, 2);
            f.push(
                "tags",
                format!("{:?}", p.tags),
                6,
                decoded.len.saturating_sub(6),
            );
        }
        Layer::Payload(data) => {
            f.push("data", short_hex(data), 0, data.len());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::packet::encode::build_packet;

    #[test]
    fn decodes_tagged_udp_with_trailer() {
        let layers = vec![
            Layer::Ethernet(Ethernet::new(
                MacAddress::BROADCAST,
                MacAddress::new([0, 0, 0, 0, 0, 1]),
            )),
            Layer::Dot1Q(Dot1Q::new(20)),
            Layer::Ipv4(Ipv4::new(
                Ipv4Addr::new(10, 0, 0, 1),
                Ipv4Addr::new(10, 0, 0, 2),
            )),
            Layer::Udp(Udp::new(5000, 6000)),
        ];
        let mut frame = build_packet(&layers).unwrap().to_vec();
        // Link padding after the IP datagram.
        frame.extend_from_slice(&[0; 6]);

        let parsed = parse_packet(&frame).unwrap();
        assert_eq!(
            parsed.layer_names(),
            vec!["ethernet", "dot1q", "ipv4", "udp", "payload"]
        );
        let vid = parsed
            .fields()
            .into_iter()
            .find(|f| f.path == "dot1q.vid")
            .unwrap();
        assert_eq!(vid.value, "20");
        assert_eq!(vid.offset, 14);
    }

    #[test]
    fn short_frame_is_truncated_error() {
        assert!(matches!(
            parse_packet(&[0; 10]),
            Err(PacketError::Truncated { needed: 14, .. })
        ));
    }

    #[test]
    fn repeated_layers_are_indexed() {
        let frame = build_packet(&[
            Layer::Ethernet(Ethernet::new(MacAddress::BROADCAST, MacAddress::ZERO)),
            Layer::Dot1Q(Dot1Q::new(100)),
            Layer::Dot1Q(Dot1Q {
                ethertype: Some(0x88cc),
                ..Dot1Q::new(200)
            }),
        ])
        .unwrap();
        let parsed = parse_packet(&frame).unwrap();
        let paths: Vec<String> = parsed.fields().into_iter().map(|f| f.path).collect();
        assert!(paths.contains(&"dot1q[1].vid".to_string()));
    }
}
