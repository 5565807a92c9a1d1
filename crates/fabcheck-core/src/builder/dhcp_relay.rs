use std::net::Ipv4Addr;

use async_trait::async_trait;
use fabcheck_api::models::{DhcpRelayConfig, DhcpRelayServer};
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;

const KIND: &str = "dhcp relay";

/// DHCP relay for one tenant segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpRelay {
    tenant: String,
    segment: String,
    servers: Vec<Ipv4Addr>,
}

impl DhcpRelay {
    pub fn new(tenant: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            segment: segment.into(),
            servers: Vec::new(),
        }
    }

    pub fn servers(mut self, servers: impl IntoIterator<Item = Ipv4Addr>) -> Self {
        self.servers.extend(servers);
        self
    }

    /// Body pushed to the controller:
    /// `{"dhcpRelayServers":[{"tenant":..,"segment":..,"servers":[..]}]}`.
    pub fn content(&self) -> DhcpRelayConfig {
        DhcpRelayConfig {
            servers: vec![self.entry()],
        }
    }

    fn entry(&self) -> DhcpRelayServer {
        DhcpRelayServer {
            tenant: self.tenant.clone(),
            segment: self.segment.clone(),
            servers: self.servers.clone(),
        }
    }

    pub async fn build(self, fabric: &Fabric) -> Result<DhcpRelayHandle, CoreError> {
        if self.servers.is_empty() {
            return Err(CoreError::validation("dhcp_relay.servers", "at least one server required"));
        }
        fabric.client().set_dhcp_relay(&self.content()).await?;
        info!(
            tenant = %self.tenant,
            segment = %self.segment,
            servers = ?self.servers,
            "dhcp relay built"
        );
        Ok(DhcpRelayHandle {
            entry: self.entry(),
            live: Liveness::default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct DhcpRelayHandle {
    entry: DhcpRelayServer,
    live: Liveness,
}

impl DhcpRelayHandle {
    /// What this handle pushed.
    pub fn entry(&self) -> &DhcpRelayServer {
        &self.entry
    }

    /// The controller's stored entry for this tenant segment, if any.
    pub async fn stored(&self, fabric: &Fabric) -> Result<Option<DhcpRelayServer>, CoreError> {
        Ok(fabric
            .dhcp_relay()
            .await?
            .servers
            .into_iter()
            .find(|s| s.tenant == self.entry.tenant && s.segment == self.entry.segment))
    }

    fn label(&self) -> String {
        format!("{}/{}", self.entry.tenant, self.entry.segment)
    }
}

#[async_trait]
impl Destroy for DhcpRelayHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with(KIND, &self.label(), || async {
                Ok(fabric
                    .client()
                    .delete_dhcp_relay(&self.entry.tenant, &self.entry.segment)
                    .await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("dhcp relay {}", self.label())
    }
}
