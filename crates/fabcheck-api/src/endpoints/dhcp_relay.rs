// DHCP relay endpoints

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::DhcpRelayConfig;

impl FabricClient {
    /// `GET dhcprelay/v1`
    pub async fn dhcp_relay(&self) -> Result<DhcpRelayConfig, Error> {
        self.get("dhcprelay/v1").await
    }

    /// `POST dhcprelay/v1`
    pub async fn set_dhcp_relay(&self, config: &DhcpRelayConfig) -> Result<(), Error> {
        debug!(entries = config.servers.len(), "configuring dhcp relay");
        self.post("dhcprelay/v1", config).await
    }

    /// `DELETE dhcprelay/v1/tenants/{tenant}/segments/{segment}`
    pub async fn delete_dhcp_relay(&self, tenant: &str, segment: &str) -> Result<(), Error> {
        debug!(tenant, segment, "removing dhcp relay");
        self.delete(&format!("dhcprelay/v1/tenants/{tenant}/segments/{segment}"))
            .await
    }
}
