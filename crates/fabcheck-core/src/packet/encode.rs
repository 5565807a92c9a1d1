// Frame assembly.
//
// Layers are serialized back to front so every header sees the finished
// bytes that follow it: lengths and checksums are computed over real data
// instead of being patched afterwards.

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};
use internet_checksum::Checksum;

use super::PacketError;
use super::layers::{
    Arp, Bootp, DHCP_MAGIC_COOKIE, DhcpOption, Dot1Q, ETHERTYPE_ARP, ETHERTYPE_IPV4,
    ETHERTYPE_PPPOE_DISCOVERY, ETHERTYPE_VLAN, Ethernet, IP_PROTO_ICMP, IP_PROTO_TCP,
    IP_PROTO_UDP, Icmp, Ipv4, Layer, PppoeDiscovery, Tcp, Udp,
};

/// Filler used when padding a frame up to a requested length (`'D'`).
pub const PAD_BYTE: u8 = 0x44;

const IPV4_HEADER_LEN: usize = 20;
const TCP_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;

/// Serialize `layers` in order into a single frame.
pub fn build_packet(layers: &[Layer]) -> Result<Bytes, PacketError> {
    let mut tail = BytesMut::new();

    for (idx, layer) in layers.iter().enumerate().rev() {
        let next = layers.get(idx + 1);
        let mut head = BytesMut::with_capacity(64 + tail.len());

        match layer {
            Layer::Ethernet(eth) => encode_ethernet(&mut head, eth, next)?,
            Layer::Dot1Q(tag) => encode_dot1q(&mut head, tag, next)?,
            Layer::Ipv4(ip) => encode_ipv4(&mut head, ip, next, tail.len())?,
            Layer::Tcp(tcp) => {
                let ip = preceding_ipv4(layers, idx, "tcp")?;
                encode_tcp(&mut head, tcp, ip, &tail)?;
            }
            Layer::Udp(udp) => {
                let ip = preceding_ipv4(layers, idx, "udp")?;
                encode_udp(&mut head, udp, ip, &tail)?;
            }
            Layer::Icmp(icmp) => encode_icmp(&mut head, icmp, &tail),
            Layer::Arp(arp) => encode_arp(&mut head, arp),
            Layer::Bootp(bootp) => encode_bootp(&mut head, bootp),
            Layer::Dhcp(options) => encode_dhcp_options(&mut head, options),
            Layer::PppoeDiscovery(pppoe) => encode_pppoe(&mut head, pppoe)?,
            Layer::Payload(data) => head.put_slice(data),
        }

        head.put_slice(&tail);
        tail = head;
    }

    Ok(tail.freeze())
}

/// Serialize `layers`, then append [`PAD_BYTE`] payload until the frame is
/// `pktlen` bytes long. Frames already at or above `pktlen` are unchanged.
pub fn build_packet_padded(layers: &[Layer], pktlen: usize) -> Result<Bytes, PacketError> {
    let frame = build_packet(layers)?;
    if frame.len() >= pktlen {
        return Ok(frame);
    }

    let mut padded = layers.to_vec();
    padded.push(Layer::Payload(Bytes::from(vec![
        PAD_BYTE;
        pktlen - frame.len()
    ])));
    build_packet(&padded)
}

// ── Inference ────────────────────────────────────────────────────────

fn infer_ethertype(next: Option<&Layer>) -> Option<u16> {
    match next? {
        Layer::Dot1Q(_) => Some(ETHERTYPE_VLAN),
        Layer::Ipv4(_) => Some(ETHERTYPE_IPV4),
        Layer::Arp(_) => Some(ETHERTYPE_ARP),
        Layer::PppoeDiscovery(_) => Some(ETHERTYPE_PPPOE_DISCOVERY),
        _ => None,
    }
}

fn infer_ip_protocol(next: Option<&Layer>) -> u8 {
    match next {
        Some(Layer::Tcp(_)) => IP_PROTO_TCP,
        Some(Layer::Udp(_)) => IP_PROTO_UDP,
        Some(Layer::Icmp(_)) => IP_PROTO_ICMP,
        _ => 0,
    }
}

fn preceding_ipv4<'a>(
    layers: &'a [Layer],
    idx: usize,
    layer: &'static str,
) -> Result<&'a Ipv4, PacketError> {
    layers[..idx]
        .iter()
        .rev()
        .find_map(|l| match l {
            Layer::Ipv4(ip) => Some(ip),
            _ => None,
        })
        .ok_or(PacketError::Layout {
            layer,
            reason: "no IPv4 header precedes it".into(),
        })
}

fn length_u16(field: &'static str, len: usize) -> Result<u16, PacketError> {
    u16::try_from(len).map_err(|_| PacketError::Field {
        field,
        reason: format!("length {len} exceeds 65535"),
    })
}

// ── L2 ───────────────────────────────────────────────────────────────

fn encode_ethernet(
    buf: &mut BytesMut,
    eth: &Ethernet,
    next: Option<&Layer>,
) -> Result<(), PacketError> {
    let ethertype = eth
        .ethertype
        .or_else(|| infer_ethertype(next))
        .ok_or(PacketError::Field {
            field: "ethernet.type",
            reason: "not set and cannot be inferred from the next layer".into(),
        })?;
    buf.put_slice(&eth.dst.octets());
    buf.put_slice(&eth.src.octets());
    buf.put_u16(ethertype);
    Ok(())
}

fn encode_dot1q(buf: &mut BytesMut, tag: &Dot1Q, next: Option<&Layer>) -> Result<(), PacketError> {
    if tag.vid > 0x0fff {
        return Err(PacketError::Field {
            field: "dot1q.vid",
            reason: format!("{} does not fit in 12 bits", tag.vid),
        });
    }
    if tag.pcp > 7 {
        return Err(PacketError::Field {
            field: "dot1q.pcp",
            reason: format!("{} does not fit in 3 bits", tag.pcp),
        });
    }
    let ethertype = tag
        .ethertype
        .or_else(|| infer_ethertype(next))
        .ok_or(PacketError::Field {
            field: "dot1q.type",
            reason: "not set and cannot be inferred from the next layer".into(),
        })?;
    let tci = (u16::from(tag.pcp) << 13) | (u16::from(tag.cfi) << 12) | tag.vid;
    buf.put_u16(tci);
    buf.put_u16(ethertype);
    Ok(())
}

fn encode_arp(buf: &mut BytesMut, arp: &Arp) {
    buf.put_u16(1); // Ethernet
    buf.put_u16(ETHERTYPE_IPV4);
    buf.put_u8(6);
    buf.put_u8(4);
    buf.put_u16(arp.op);
    buf.put_slice(&arp.sha.octets());
    buf.put_slice(&arp.spa.octets());
    buf.put_slice(&arp.tha.octets());
    buf.put_slice(&arp.tpa.octets());
}

// ── L3 ───────────────────────────────────────────────────────────────

fn encode_ipv4(
    buf: &mut BytesMut,
    ip: &Ipv4,
    next: Option<&Layer>,
    payload_len: usize,
) -> Result<(), PacketError> {
    if ip.flags > 0x07 {
        return Err(PacketError::Field {
            field: "ipv4.flags",
            reason: format!("{:#x} does not fit in 3 bits", ip.flags),
        });
    }
    if ip.frag_offset > 0x1fff {
        return Err(PacketError::Field {
            field: "ipv4.frag",
            reason: format!("{} does not fit in 13 bits", ip.frag_offset),
        });
    }
    let total_len = length_u16("ipv4.len", IPV4_HEADER_LEN + payload_len)?;
    let protocol = ip.protocol.unwrap_or_else(|| infer_ip_protocol(next));

    let start = buf.len();
    buf.put_u8(0x45);
    buf.put_u8(ip.tos);
    buf.put_u16(total_len);
    buf.put_u16(ip.id);
    buf.put_u16((u16::from(ip.flags) << 13) | ip.frag_offset);
    buf.put_u8(ip.ttl);
    buf.put_u8(protocol);
    buf.put_u16(0);
    buf.put_slice(&ip.src.octets());
    buf.put_slice(&ip.dst.octets());

    let cksum = match ip.checksum {
        Some(explicit) => explicit.to_be_bytes(),
        None => {
            let mut cksum = Checksum::new();
            cksum.add_bytes(&buf[start..]);
            cksum.checksum()
        }
    };
    buf[start + 10..start + 12].copy_from_slice(&cksum);
    Ok(())
}

// ── L4 ───────────────────────────────────────────────────────────────

/// Checksum over the IPv4 pseudo-header, the L4 header and its payload.
fn l4_checksum(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, segment: &[u8]) -> [u8; 2] {
    let mut cksum = Checksum::new();
    cksum.add_bytes(&src.octets());
    cksum.add_bytes(&dst.octets());
    cksum.add_bytes(&[0, protocol]);
    // Callers have already bounded the segment length to u16.
    cksum.add_bytes(&u16::try_from(segment.len()).unwrap_or(u16::MAX).to_be_bytes());
    cksum.add_bytes(segment);
    cksum.checksum()
}

fn encode_tcp(buf: &mut BytesMut, tcp: &Tcp, ip: &Ipv4, payload: &[u8]) -> Result<(), PacketError> {
    length_u16("tcp.len", TCP_HEADER_LEN + payload.len())?;

    let start = buf.len();
    buf.put_u16(tcp.sport);
    buf.put_u16(tcp.dport);
    buf.put_u32(tcp.seq);
    buf.put_u32(tcp.ack);
    buf.put_u8(5 << 4);
    buf.put_u8(tcp.flags);
    buf.put_u16(tcp.window);
    buf.put_u16(0);
    buf.put_u16(tcp.urgent);

    let cksum = match tcp.checksum {
        Some(explicit) => explicit.to_be_bytes(),
        None => {
            let mut segment = buf[start..].to_vec();
            segment.extend_from_slice(payload);
            l4_checksum(ip.src, ip.dst, IP_PROTO_TCP, &segment)
        }
    };
    buf[start + 16..start + 18].copy_from_slice(&cksum);
    Ok(())
}

fn encode_udp(buf: &mut BytesMut, udp: &Udp, ip: &Ipv4, payload: &[u8]) -> Result<(), PacketError> {
    let len = length_u16("udp.len", UDP_HEADER_LEN + payload.len())?;

    let start = buf.len();
    buf.put_u16(udp.sport);
    buf.put_u16(udp.dport);
    buf.put_u16(len);
    buf.put_u16(0);

    let cksum = match udp.checksum {
        Some(explicit) => explicit.to_be_bytes(),
        None => {
            let mut segment = buf[start..].to_vec();
            segment.extend_from_slice(payload);
            let computed = l4_checksum(ip.src, ip.dst, IP_PROTO_UDP, &segment);
            // A computed zero is transmitted as all ones (RFC 768).
            if computed == [0, 0] { [0xff, 0xff] } else { computed }
        }
    };
    buf[start + 6..start + 8].copy_from_slice(&cksum);
    Ok(())
}

fn encode_icmp(buf: &mut BytesMut, icmp: &Icmp, payload: &[u8]) {
    let start = buf.len();
    buf.put_u8(icmp.icmp_type);
    buf.put_u8(icmp.code);
    buf.put_u16(0);
    buf.put_u16(icmp.id);
    buf.put_u16(icmp.seq);

    let cksum = match icmp.checksum {
        Some(explicit) => explicit.to_be_bytes(),
        None => {
            let mut cksum = Checksum::new();
            cksum.add_bytes(&buf[start..]);
            cksum.add_bytes(payload);
            cksum.checksum()
        }
    };
    buf[start + 2..start + 4].copy_from_slice(&cksum);
}

// ── BOOTP / DHCP ─────────────────────────────────────────────────────

fn encode_bootp(buf: &mut BytesMut, bootp: &Bootp) {
    buf.put_u8(bootp.op);
    buf.put_u8(1); // htype: Ethernet
    buf.put_u8(6); // hlen
    buf.put_u8(bootp.hops);
    buf.put_u32(bootp.xid);
    buf.put_u16(bootp.secs);
    buf.put_u16(bootp.flags);
    buf.put_slice(&bootp.ciaddr.octets());
    buf.put_slice(&bootp.yiaddr.octets());
    buf.put_slice(&bootp.siaddr.octets());
    buf.put_slice(&bootp.giaddr.octets());
    buf.put_slice(&bootp.chaddr.octets());
    buf.put_bytes(0, 10); // chaddr padding
    buf.put_bytes(0, 64); // sname
    buf.put_bytes(0, 128); // file
    buf.put_u32(DHCP_MAGIC_COOKIE);
}

fn put_option(buf: &mut BytesMut, code: u8, data: &[u8]) {
    buf.put_u8(code);
    // Option payloads are at most 255 bytes; longer data is truncated.
    let len = u8::try_from(data.len()).unwrap_or(u8::MAX);
    buf.put_u8(len);
    buf.put_slice(&data[..usize::from(len)]);
}

fn encode_dhcp_options(buf: &mut BytesMut, options: &[DhcpOption]) {
    for option in options {
        match option {
            DhcpOption::Pad => buf.put_u8(DhcpOption::PAD),
            DhcpOption::SubnetMask(mask) => {
                put_option(buf, DhcpOption::SUBNET_MASK, &mask.octets());
            }
            DhcpOption::Router(addr) => put_option(buf, DhcpOption::ROUTER, &addr.octets()),
            DhcpOption::RequestedAddr(addr) => {
                put_option(buf, DhcpOption::REQUESTED_ADDR, &addr.octets());
            }
            DhcpOption::LeaseTime(secs) => {
                put_option(buf, DhcpOption::LEASE_TIME, &secs.to_be_bytes());
            }
            DhcpOption::MessageType(kind) => {
                put_option(buf, DhcpOption::MESSAGE_TYPE, &[u8::from(*kind)]);
            }
            DhcpOption::ServerId(addr) => put_option(buf, DhcpOption::SERVER_ID, &addr.octets()),
            DhcpOption::ParamRequestList(codes) => {
                put_option(buf, DhcpOption::PARAM_REQUEST_LIST, codes);
            }
            DhcpOption::Raw { code, data } => put_option(buf, *code, data),
            DhcpOption::End => buf.put_u8(DhcpOption::END),
        }
    }
    if options.last() != Some(&DhcpOption::End) {
        buf.put_u8(DhcpOption::END);
    }
}

// ── PPPoE discovery ──────────────────────────────────────────────────

// The length field covers the tags only; anything after them is link
// padding.
fn encode_pppoe(buf: &mut BytesMut, pppoe: &PppoeDiscovery) -> Result<(), PacketError> {
    let tags_len: usize = pppoe.tags.iter().map(|t| 4 + t.value.len()).sum();
    let len = length_u16("pppoe.len", tags_len)?;

    buf.put_u8(0x11); // version 1, type 1
    buf.put_u8(pppoe.code);
    buf.put_u16(pppoe.session_id);
    buf.put_u16(len);
    for tag in &pppoe.tags {
        buf.put_u16(tag.tag_type);
        buf.put_u16(length_u16("pppoe.tag", tag.value.len())?);
        buf.put_slice(&tag.value);
    }
    Ok(())
}
