// ── Fabric handle ──
//
// A connected controller plus the timing profile of the run. Builders take
// `&Fabric` to push and delete configuration; the read helpers here are
// what tests use to check round trips and verify that a rejected push left
// stored state alone.

use std::time::Duration;

use fabcheck_api::models::{
    DhcpRelayConfig, GroupMembers, PppoeiaOverview, PppoeiaPortRecord, PppoeiaStats,
    RouterRecord, SegmentRecord, SflowRecord, SpanSession, StaticVlanConfig, TenantRecord,
    UserRecord, VlanConfig,
};
use fabcheck_api::{Credentials, FabricClient, TlsMode, TransportConfig};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::timing::Timing;

/// Everything needed to talk to one controller.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    /// Controller URL, with or without the `/mars/` prefix.
    pub url: String,
    pub credentials: Credentials,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub timing: Timing,
}

impl FabricConfig {
    pub fn new(url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            url: url.into(),
            credentials,
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            timing: Timing::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fabric {
    client: FabricClient,
    timing: Timing,
}

impl Fabric {
    /// Build the HTTP client. No request is sent until the first call.
    pub fn connect(config: &FabricConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            tls: config.tls.clone(),
            ..TransportConfig::default()
        }
        .with_timeout(config.timeout);
        let client = FabricClient::new(&config.url, config.credentials.clone(), &transport)?;
        info!(
            url = %client.base_url(),
            user = ?config.credentials.username(),
            "fabric client ready"
        );
        Ok(Self {
            client,
            timing: config.timing,
        })
    }

    pub fn from_client(client: FabricClient, timing: Timing) -> Self {
        Self { client, timing }
    }

    pub fn client(&self) -> &FabricClient {
        &self.client
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    // ── Tenants & segments ───────────────────────────────────────────

    pub async fn tenants(&self) -> Result<Vec<TenantRecord>, CoreError> {
        Ok(self.client.list_tenants().await?.tenants)
    }

    pub async fn tenant_exists(&self, name: &str) -> Result<bool, CoreError> {
        Ok(self.tenants().await?.iter().any(|t| t.name == name))
    }

    pub async fn segments(&self) -> Result<Vec<SegmentRecord>, CoreError> {
        Ok(self.client.list_segments().await?.segments)
    }

    pub async fn segment_exists(&self, tenant: &str, segment: &str) -> Result<bool, CoreError> {
        match self.client.get_segment(tenant, segment).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    // ── Routers ──────────────────────────────────────────────────────

    pub async fn routers(&self) -> Result<Vec<RouterRecord>, CoreError> {
        Ok(self.client.list_routers().await?.routers)
    }

    pub async fn tenant_routers(&self, tenant: &str) -> Result<Vec<RouterRecord>, CoreError> {
        Ok(self.client.list_tenant_routers(tenant).await?.routers)
    }

    pub async fn router_exists(&self, tenant: &str, router: &str) -> Result<bool, CoreError> {
        match self.tenant_routers(tenant).await {
            Ok(routers) => Ok(routers.iter().any(|r| r.name == router)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ── DHCP relay / SPAN ────────────────────────────────────────────

    pub async fn dhcp_relay(&self) -> Result<DhcpRelayConfig, CoreError> {
        Ok(self.client.dhcp_relay().await?)
    }

    pub async fn span_sessions(&self) -> Result<Vec<SpanSession>, CoreError> {
        Ok(self.client.list_span_sessions().await?.sessions)
    }

    pub async fn span_session(&self, session: u32) -> Result<SpanSession, CoreError> {
        Ok(self.client.span_session(session).await?)
    }

    // ── sFlow ────────────────────────────────────────────────────────

    pub async fn sflow_all(&self) -> Result<Vec<SflowRecord>, CoreError> {
        Ok(self.client.list_sflow().await?.sflows)
    }

    /// `None` when the device has no sFlow configuration (the controller
    /// answers with an empty object).
    pub async fn sflow_by_device(&self, device: &str) -> Result<Option<SflowRecord>, CoreError> {
        Ok(self.client.sflow(device).await?)
    }

    /// Delete and confirm the configuration is gone.
    pub async fn delete_sflow(&self, device: &str) -> Result<(), CoreError> {
        self.client.delete_sflow(device).await?;
        if let Some(left) = self.sflow_by_device(device).await? {
            return Err(CoreError::StateChanged {
                before: "deleted".into(),
                after: format!("{left:?}"),
            });
        }
        debug!(device, "sflow deleted");
        Ok(())
    }

    /// Delete without reading back, for cleanup of possibly-absent config.
    pub async fn delete_sflow_unverified(&self, device: &str) -> Result<(), CoreError> {
        Ok(self.client.delete_sflow(device).await?)
    }

    // ── PPPoE IA ─────────────────────────────────────────────────────

    pub async fn pppoeia_devices(&self) -> Result<PppoeiaOverview, CoreError> {
        Ok(self.client.pppoeia().await?)
    }

    pub async fn pppoeia_ports(&self) -> Result<Vec<PppoeiaPortRecord>, CoreError> {
        Ok(self.client.pppoeia_ports().await?.ports)
    }

    pub async fn pppoeia_ports_by_device(
        &self,
        device: &str,
    ) -> Result<Vec<PppoeiaPortRecord>, CoreError> {
        Ok(self.client.pppoeia_ports_by_device(device).await?.ports)
    }

    pub async fn pppoeia_port_stats(&self) -> Result<Vec<PppoeiaStats>, CoreError> {
        Ok(self.client.pppoeia_stats().await?.statistics)
    }

    pub async fn pppoeia_port_stats_by_device(
        &self,
        device: &str,
    ) -> Result<Vec<PppoeiaStats>, CoreError> {
        Ok(self.client.pppoeia_stats_by_device(device).await?.statistics)
    }

    // ── VLAN ─────────────────────────────────────────────────────────

    pub async fn vlans(&self) -> Result<Vec<VlanConfig>, CoreError> {
        Ok(self.client.list_vlans().await?.devices)
    }

    pub async fn static_vlans(&self) -> Result<Vec<StaticVlanConfig>, CoreError> {
        Ok(self.client.list_static_vlans().await?.devices)
    }

    // ── User accounts ────────────────────────────────────────────────

    pub async fn users(&self) -> Result<Vec<UserRecord>, CoreError> {
        Ok(self.client.list_users().await?.users)
    }

    pub async fn users_in_group(&self, group: &str) -> Result<GroupMembers, CoreError> {
        Ok(self.client.users_in_group(group).await?)
    }

    pub async fn user(&self, name: &str) -> Result<UserRecord, CoreError> {
        Ok(self.client.user(name).await?)
    }
}
