// Tenant and segment endpoints
//
// Tenants live under `v1/tenants/v1`; segments, their members and their
// access/network ports nest beneath the owning tenant. Uplink segments are
// fabric-wide and live under `topology/v1`.

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{
    AccessPortRequest, NetworkPortRequest, SegmentList, SegmentMemberRequest, SegmentRecord,
    SegmentRequest, TenantList, TenantRequest, UplinkSegmentList, UplinkSegmentRequest,
};

impl FabricClient {
    // ── Tenants ──────────────────────────────────────────────────────

    /// `GET v1/tenants/v1`
    pub async fn list_tenants(&self) -> Result<TenantList, Error> {
        self.get("v1/tenants/v1").await
    }

    /// `POST v1/tenants/v1`
    pub async fn create_tenant(&self, req: &TenantRequest) -> Result<(), Error> {
        debug!(tenant = %req.name, kind = %req.kind, "creating tenant");
        self.post("v1/tenants/v1", req).await
    }

    /// `DELETE v1/tenants/v1/{tenant}`
    pub async fn delete_tenant(&self, tenant: &str) -> Result<(), Error> {
        debug!(tenant, "deleting tenant");
        self.delete(&format!("v1/tenants/v1/{tenant}")).await
    }

    // ── Segments ─────────────────────────────────────────────────────

    /// `GET v1/tenants/v1/segments` (every tenant's segments)
    pub async fn list_segments(&self) -> Result<SegmentList, Error> {
        self.get("v1/tenants/v1/segments").await
    }

    /// `GET v1/tenants/v1/{tenant}/segments/{segment}`
    pub async fn get_segment(&self, tenant: &str, segment: &str) -> Result<SegmentRecord, Error> {
        self.get(&format!("v1/tenants/v1/{tenant}/segments/{segment}"))
            .await
    }

    /// `POST v1/tenants/v1/{tenant}/segments`
    pub async fn create_segment(&self, tenant: &str, req: &SegmentRequest) -> Result<(), Error> {
        debug!(
            tenant,
            segment = %req.name,
            kind = %req.segment_type,
            value = req.value,
            "creating segment"
        );
        self.post(&format!("v1/tenants/v1/{tenant}/segments"), req)
            .await
    }

    /// `DELETE v1/tenants/v1/{tenant}/segments/{segment}`
    pub async fn delete_segment(&self, tenant: &str, segment: &str) -> Result<(), Error> {
        debug!(tenant, segment, "deleting segment");
        self.delete(&format!("v1/tenants/v1/{tenant}/segments/{segment}"))
            .await
    }

    /// `POST v1/tenants/v1/{tenant}/segments/{segment}/device/{device}/vlan`
    pub async fn add_segment_member(
        &self,
        tenant: &str,
        segment: &str,
        device: &str,
        req: &SegmentMemberRequest,
    ) -> Result<(), Error> {
        debug!(tenant, segment, device, ports = ?req.ports, "adding segment member");
        self.post(
            &format!("v1/tenants/v1/{tenant}/segments/{segment}/device/{device}/vlan"),
            req,
        )
        .await
    }

    /// `POST v1/tenants/v1/{tenant}/segments/{segment}/access`
    pub async fn add_access_port(
        &self,
        tenant: &str,
        segment: &str,
        req: &AccessPortRequest,
    ) -> Result<(), Error> {
        debug!(tenant, segment, port = %req.name, "adding access port");
        self.post(&format!("v1/tenants/v1/{tenant}/segments/{segment}/access"), req)
            .await
    }

    /// `POST v1/tenants/v1/{tenant}/segments/{segment}/network`
    pub async fn add_network_port(
        &self,
        tenant: &str,
        segment: &str,
        req: &NetworkPortRequest,
    ) -> Result<(), Error> {
        debug!(tenant, segment, port = %req.name, "adding network port");
        self.post(
            &format!("v1/tenants/v1/{tenant}/segments/{segment}/network"),
            req,
        )
        .await
    }

    // ── Uplink segments ──────────────────────────────────────────────

    /// `GET topology/v1/uplink-segments`
    pub async fn list_uplink_segments(&self) -> Result<UplinkSegmentList, Error> {
        self.get("topology/v1/uplink-segments").await
    }

    /// `POST topology/v1/uplink-segments`
    pub async fn create_uplink_segment(&self, req: &UplinkSegmentRequest) -> Result<(), Error> {
        debug!(
            name = %req.name,
            device = %req.device_id,
            vlan = req.vlan,
            "creating uplink segment"
        );
        self.post("topology/v1/uplink-segments", req).await
    }

    /// `DELETE topology/v1/uplink-segments/{name}`
    pub async fn delete_uplink_segment(&self, name: &str) -> Result<(), Error> {
        debug!(name, "deleting uplink segment");
        self.delete(&format!("topology/v1/uplink-segments/{name}"))
            .await
    }
}
