// VLAN interface and static VLAN membership endpoints

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{StaticVlanConfig, StaticVlanList, VlanConfig, VlanList};

impl FabricClient {
    // ── VLAN interfaces ──────────────────────────────────────────────

    /// `GET vlan/v1`
    pub async fn list_vlans(&self) -> Result<VlanList, Error> {
        self.get("vlan/v1").await
    }

    /// `POST vlan/v1`
    pub async fn set_vlans(&self, config: &VlanConfig) -> Result<(), Error> {
        debug!(device = %config.device_id, count = config.vlans.len(), "configuring vlans");
        self.post("vlan/v1", config).await
    }

    /// `DELETE vlan/v1/{device}`
    pub async fn delete_vlans(&self, device: &str) -> Result<(), Error> {
        debug!(device, "deleting vlans");
        self.delete(&format!("vlan/v1/{device}")).await
    }

    // ── Static VLAN membership ───────────────────────────────────────

    /// `GET staticvlan/v1`
    pub async fn list_static_vlans(&self) -> Result<StaticVlanList, Error> {
        self.get("staticvlan/v1").await
    }

    /// `POST staticvlan/v1`
    pub async fn set_static_vlans(&self, config: &StaticVlanConfig) -> Result<(), Error> {
        debug!(device = %config.device_id, ports = config.ports.len(), "configuring static vlans");
        self.post("staticvlan/v1", config).await
    }

    /// `DELETE staticvlan/v1/{device}`
    pub async fn delete_static_vlans(&self, device: &str) -> Result<(), Error> {
        debug!(device, "deleting static vlans");
        self.delete(&format!("staticvlan/v1/{device}")).await
    }
}
