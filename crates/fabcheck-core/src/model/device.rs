// ── Device domain types ──

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use strum::{Display, EnumString};

use super::mac::MacAddress;
use super::port::{Nos, Port};

/// Role a switch plays in the leaf/spine fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceRole {
    Spine,
    Leaf,
}

/// A fabric switch under test.
///
/// Created from static configuration and read-only for the duration of a
/// run. `front_ports` holds the four front-panel port numbers (A-D) wired
/// to hosts or to the packet-injection rig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Controller device id (e.g. `of:0000000000000001` or `rest:192.168.40.1:80`).
    pub id: String,
    pub name: String,
    pub role: DeviceRole,
    #[serde(default)]
    pub device_type: Option<String>,
    pub mgmt_ip: Ipv4Addr,
    #[serde(default)]
    pub mgmt_port: Option<u16>,
    pub mac: MacAddress,
    #[serde(default)]
    pub nos: Nos,
    #[serde(default)]
    pub mfr: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    pub front_ports: [u32; 4],
}

impl Device {
    /// Front-panel port A..D as an untagged [`Port`] carrying this
    /// device's NOS. Index 0 = A.
    pub fn front_port(&self, index: usize) -> Option<Port> {
        self.front_ports
            .get(index)
            .map(|n| Port::new(*n).on_device(&self.id).nos(self.nos))
    }

    pub fn port_a(&self) -> Option<Port> {
        self.front_port(0)
    }

    pub fn port_b(&self) -> Option<Port> {
        self.front_port(1)
    }

    pub fn is_spine(&self) -> bool {
        self.role == DeviceRole::Spine
    }
}

/// An end host, external router, or DHCP server attached to the fabric.
///
/// `ip` is optional because test cases assign host addresses per scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub id: String,
    pub mac: MacAddress,
    #[serde(default)]
    pub ip: Option<Ipv4Addr>,
    #[serde(default)]
    pub mgmt_ip: Option<Ipv4Addr>,
    #[serde(default)]
    pub nic_name: Option<String>,
}

impl Host {
    /// Copy of this host with a scenario-specific address.
    pub fn with_ip(&self, ip: Ipv4Addr) -> Self {
        Self {
            ip: Some(ip),
            ..self.clone()
        }
    }
}
