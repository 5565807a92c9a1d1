// Per-device VLAN interfaces and static VLAN port membership.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use fabcheck_api::models::{StaticVlanConfig, StaticVlanPort, SwitchportMode, VlanConfig, VlanEntry};
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;

fn check_vid(field: &str, vid: u16) -> Result<(), CoreError> {
    if (1..=4094).contains(&vid) {
        Ok(())
    } else {
        Err(CoreError::validation(field, format!("{vid} outside 1..=4094")))
    }
}

// ── VLAN interfaces ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vlan {
    config: VlanConfig,
}

impl Vlan {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            config: VlanConfig {
                device_id: device_id.into(),
                vlans: Vec::new(),
            },
        }
    }

    pub fn vlan(mut self, vlan: u16, ip: Ipv4Addr, mask: Ipv4Addr) -> Self {
        self.config.vlans.push(VlanEntry { vlan, ip, mask });
        self
    }

    pub fn config(&self) -> &VlanConfig {
        &self.config
    }

    pub async fn build(self, fabric: &Fabric) -> Result<VlanHandle, CoreError> {
        for entry in &self.config.vlans {
            check_vid("vlan.vlan", entry.vlan)?;
        }
        fabric.client().set_vlans(&self.config).await?;
        info!(device = %self.config.device_id, count = self.config.vlans.len(), "vlans built");
        Ok(VlanHandle {
            device_id: self.config.device_id,
            live: Liveness::default(),
        })
    }

    /// Delete a device's VLAN configuration without reading back.
    pub async fn delete_unverified(fabric: &Fabric, device_id: &str) -> Result<(), CoreError> {
        Ok(fabric.client().delete_vlans(device_id).await?)
    }
}

#[derive(Debug, Clone)]
pub struct VlanHandle {
    device_id: String,
    live: Liveness,
}

impl VlanHandle {
    pub async fn stored(&self, fabric: &Fabric) -> Result<Option<VlanConfig>, CoreError> {
        Ok(fabric
            .vlans()
            .await?
            .into_iter()
            .find(|c| c.device_id == self.device_id))
    }
}

#[async_trait]
impl Destroy for VlanHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with("vlan", &self.device_id, || async {
                fabric.client().delete_vlans(&self.device_id).await?;
                match self.stored(fabric).await? {
                    Some(left) if !left.vlans.is_empty() => Err(CoreError::StateChanged {
                        before: "deleted".into(),
                        after: format!("{left:?}"),
                    }),
                    _ => Ok(()),
                }
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("vlan {}", self.device_id)
    }
}

// ── Static VLAN membership ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticVlan {
    config: StaticVlanConfig,
}

impl StaticVlan {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            config: StaticVlanConfig {
                device_id: device_id.into(),
                ports: Vec::new(),
            },
        }
    }

    /// `vlans` entries are `"<vid>/tag"` or `"<vid>/untag"`.
    pub fn port<I, S>(mut self, port: u32, native: u16, mode: SwitchportMode, vlans: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ports.push(StaticVlanPort {
            port,
            native,
            mode,
            vlans: vlans.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn config(&self) -> &StaticVlanConfig {
        &self.config
    }

    fn validate(&self) -> Result<(), CoreError> {
        for port in &self.config.ports {
            check_vid("static_vlan.native", port.native)?;
            for entry in &port.vlans {
                let valid = entry.split_once('/').is_some_and(|(vid, mode)| {
                    vid.parse::<u16>().is_ok_and(|v| (1..=4094).contains(&v))
                        && matches!(mode, "tag" | "untag")
                });
                if !valid {
                    return Err(CoreError::validation(
                        "static_vlan.vlans",
                        format!("'{entry}' on port {} is not <vid>/tag|untag", port.port),
                    ));
                }
            }
        }
        Ok(())
    }

    pub async fn build(self, fabric: &Fabric) -> Result<StaticVlanHandle, CoreError> {
        self.validate()?;
        fabric.client().set_static_vlans(&self.config).await?;
        info!(
            device = %self.config.device_id,
            ports = self.config.ports.len(),
            "static vlans built"
        );
        Ok(StaticVlanHandle {
            device_id: self.config.device_id,
            live: Liveness::default(),
        })
    }

    pub async fn delete_unverified(fabric: &Fabric, device_id: &str) -> Result<(), CoreError> {
        Ok(fabric.client().delete_static_vlans(device_id).await?)
    }
}

#[derive(Debug, Clone)]
pub struct StaticVlanHandle {
    device_id: String,
    live: Liveness,
}

#[async_trait]
impl Destroy for StaticVlanHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with("static vlan", &self.device_id, || async {
                Ok(fabric.client().delete_static_vlans(&self.device_id).await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("static vlan {}", self.device_id)
    }
}
