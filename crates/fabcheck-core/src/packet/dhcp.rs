// ── DHCP relay frames ──
//
// The four-message exchange as seen on both sides of a relaying fabric.
// Client-side frames are broadcast from the client; relayed frames carry
// the fabric gateway MAC, `giaddr` set to the client-facing gateway and
// `hops` incremented.

use std::net::Ipv4Addr;

use bytes::Bytes;

use super::PacketError;
use super::encode::build_packet;
use super::layers::{Bootp, DhcpMessageType, DhcpOption, Ethernet, Ipv4, Layer, Udp};
use crate::model::MacAddress;

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;

/// Participants and addresses of one relayed lease exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpExchange {
    pub client_mac: MacAddress,
    /// MAC the fabric uses when forwarding relayed frames.
    pub relay_mac: MacAddress,
    pub server_mac: MacAddress,
    pub server_ip: Ipv4Addr,
    /// Gateway address on the client's segment; written into `giaddr`.
    pub client_gateway: Ipv4Addr,
    /// Gateway address on the server's segment; source of relayed requests.
    pub server_gateway: Ipv4Addr,
    pub allocated_ip: Ipv4Addr,
    pub xid: u32,
    pub lease_secs: u32,
    pub subnet_mask: Ipv4Addr,
}

impl DhcpExchange {
    pub fn new(
        client_mac: MacAddress,
        relay_mac: MacAddress,
        server_mac: MacAddress,
        server_ip: Ipv4Addr,
    ) -> Self {
        Self {
            client_mac,
            relay_mac,
            server_mac,
            server_ip,
            client_gateway: Ipv4Addr::UNSPECIFIED,
            server_gateway: Ipv4Addr::UNSPECIFIED,
            allocated_ip: Ipv4Addr::UNSPECIFIED,
            xid: 1234,
            lease_secs: 1800,
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
        }
    }

    pub fn gateways(mut self, client_side: Ipv4Addr, server_side: Ipv4Addr) -> Self {
        self.client_gateway = client_side;
        self.server_gateway = server_side;
        self
    }

    pub fn allocated(mut self, ip: Ipv4Addr) -> Self {
        self.allocated_ip = ip;
        self
    }

    // ── Client -> relay -> server ────────────────────────────────────

    pub fn discover(&self) -> Result<Bytes, PacketError> {
        self.client_broadcast(
            Bootp::FLAG_BROADCAST,
            vec![DhcpOption::MessageType(DhcpMessageType::Discover)],
        )
    }

    pub fn relayed_discover(&self) -> Result<Bytes, PacketError> {
        self.relayed_to_server(
            Bootp::FLAG_BROADCAST,
            vec![DhcpOption::MessageType(DhcpMessageType::Discover)],
        )
    }

    pub fn request(&self) -> Result<Bytes, PacketError> {
        self.client_broadcast(0, self.request_options())
    }

    pub fn relayed_request(&self) -> Result<Bytes, PacketError> {
        self.relayed_to_server(0, self.request_options())
    }

    // ── Server -> relay -> client ────────────────────────────────────

    pub fn offer(&self) -> Result<Bytes, PacketError> {
        self.server_reply(DhcpMessageType::Offer)
    }

    pub fn relayed_offer(&self) -> Result<Bytes, PacketError> {
        self.relayed_to_client(DhcpMessageType::Offer)
    }

    pub fn ack(&self) -> Result<Bytes, PacketError> {
        self.server_reply(DhcpMessageType::Ack)
    }

    pub fn relayed_ack(&self) -> Result<Bytes, PacketError> {
        self.relayed_to_client(DhcpMessageType::Ack)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn request_options(&self) -> Vec<DhcpOption> {
        vec![
            DhcpOption::MessageType(DhcpMessageType::Request),
            DhcpOption::ServerId(self.server_ip),
            DhcpOption::RequestedAddr(self.allocated_ip),
        ]
    }

    fn reply_options(&self, kind: DhcpMessageType) -> Vec<DhcpOption> {
        vec![
            DhcpOption::MessageType(kind),
            DhcpOption::ServerId(self.server_ip),
            DhcpOption::LeaseTime(self.lease_secs),
            DhcpOption::SubnetMask(self.subnet_mask),
        ]
    }

    fn client_broadcast(&self, flags: u16, options: Vec<DhcpOption>) -> Result<Bytes, PacketError> {
        build_packet(&[
            Layer::Ethernet(Ethernet::new(MacAddress::BROADCAST, self.client_mac)),
            Layer::Ipv4(Ipv4::new(Ipv4Addr::UNSPECIFIED, Ipv4Addr::BROADCAST)),
            Layer::Udp(Udp::new(DHCP_CLIENT_PORT, DHCP_SERVER_PORT)),
            Layer::Bootp(Bootp {
                xid: self.xid,
                flags,
                chaddr: self.client_mac,
                ..Bootp::default()
            }),
            Layer::Dhcp(options),
        ])
    }

    fn relayed_to_server(
        &self,
        flags: u16,
        options: Vec<DhcpOption>,
    ) -> Result<Bytes, PacketError> {
        build_packet(&[
            Layer::Ethernet(Ethernet::new(self.server_mac, self.relay_mac)),
            Layer::Ipv4(Ipv4 {
                id: 0,
                flags: Ipv4::FLAG_DF,
                ..Ipv4::new(self.server_gateway, self.server_ip)
            }),
            Layer::Udp(Udp::new(DHCP_SERVER_PORT, DHCP_SERVER_PORT)),
            Layer::Bootp(Bootp {
                xid: self.xid,
                flags,
                hops: 1,
                giaddr: self.client_gateway,
                chaddr: self.client_mac,
                ..Bootp::default()
            }),
            Layer::Dhcp(options),
        ])
    }

    fn reply_bootp(&self) -> Bootp {
        Bootp {
            op: Bootp::REPLY,
            xid: self.xid,
            secs: 128,
            yiaddr: self.allocated_ip,
            giaddr: self.client_gateway,
            chaddr: self.client_mac,
            ..Bootp::default()
        }
    }

    fn server_reply(&self, kind: DhcpMessageType) -> Result<Bytes, PacketError> {
        build_packet(&[
            Layer::Ethernet(Ethernet::new(self.relay_mac, self.server_mac)),
            Layer::Ipv4(Ipv4 {
                flags: Ipv4::FLAG_DF,
                ..Ipv4::new(self.server_ip, self.client_gateway)
            }),
            Layer::Udp(Udp::new(DHCP_SERVER_PORT, DHCP_SERVER_PORT)),
            Layer::Bootp(self.reply_bootp()),
            Layer::Dhcp(self.reply_options(kind)),
        ])
    }

    fn relayed_to_client(&self, kind: DhcpMessageType) -> Result<Bytes, PacketError> {
        build_packet(&[
            Layer::Ethernet(Ethernet::new(self.client_mac, self.relay_mac)),
            Layer::Ipv4(Ipv4 {
                id: 0,
                flags: Ipv4::FLAG_DF,
                ..Ipv4::new(self.client_gateway, self.allocated_ip)
            }),
            Layer::Udp(Udp::new(DHCP_SERVER_PORT, DHCP_CLIENT_PORT)),
            Layer::Bootp(self.reply_bootp()),
            Layer::Dhcp(self.reply_options(kind)),
        ])
    }
}
