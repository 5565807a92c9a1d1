// Tenant builder: a tenant plus the segments, segment members and
// access/network ports nested under it.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use fabcheck_api::models::{
    AccessPortRequest, NetworkPortRequest, SegmentMemberRequest, SegmentRequest, SegmentType,
    TenantKind, TenantRequest,
};
use indexmap::IndexMap;
use tracing::{info, warn};

use super::uplink::{UplinkSegment, UplinkSegmentHandle};
use super::{Destroy, Liveness, check_unchanged, expect_rejection};
use crate::error::CoreError;
use crate::fabric::Fabric;
use crate::model::Port;

const KIND: &str = "tenant";

// ── Nested pieces ────────────────────────────────────────────────────

/// Ports of one device joined to a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMember {
    segment: String,
    device_id: String,
    ports: Vec<Port>,
}

impl SegmentMember {
    pub fn new(segment: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            device_id: device_id.into(),
            ports: Vec::new(),
        }
    }

    pub fn ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.ports.extend(ports);
        self
    }

    fn request(&self) -> SegmentMemberRequest {
        SegmentMemberRequest {
            ports: self.ports.iter().map(Port::name).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPort {
    segment: String,
    request: AccessPortRequest,
}

impl AccessPort {
    pub fn new(
        segment: impl Into<String>,
        name: impl Into<String>,
        device_id: impl Into<String>,
        port: u32,
        vlan: u16,
    ) -> Self {
        Self {
            segment: segment.into(),
            request: AccessPortRequest {
                name: name.into(),
                port_type: "access".into(),
                device_id: device_id.into(),
                port,
                vlan,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPort {
    segment: String,
    request: NetworkPortRequest,
}

impl NetworkPort {
    pub fn new(
        segment: impl Into<String>,
        name: impl Into<String>,
        ip_addresses: impl IntoIterator<Item = Ipv4Addr>,
        uplink_segment: impl Into<String>,
    ) -> Self {
        Self {
            segment: segment.into(),
            request: NetworkPortRequest {
                name: name.into(),
                port_type: "network".into(),
                ip_addresses: ip_addresses.into_iter().collect(),
                uplink_segment: uplink_segment.into(),
            },
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Tenant {
    name: String,
    kind: TenantKind,
    segments: IndexMap<String, SegmentRequest>,
    members: Vec<SegmentMember>,
    access_ports: Vec<AccessPort>,
    network_ports: Vec<NetworkPort>,
    uplinks: Vec<UplinkSegment>,
}

impl Tenant {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_kind(name, TenantKind::Normal)
    }

    pub fn system(name: impl Into<String>) -> Self {
        Self::with_kind(name, TenantKind::System)
    }

    fn with_kind(name: impl Into<String>, kind: TenantKind) -> Self {
        Self {
            name: name.into(),
            kind,
            segments: IndexMap::new(),
            members: Vec::new(),
            access_ports: Vec::new(),
            network_ports: Vec::new(),
            uplinks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a segment. `value` is the VLAN id or VXLAN VNI.
    pub fn segment(
        mut self,
        name: impl Into<String>,
        segment_type: SegmentType,
        ip_address: impl IntoIterator<Item = Ipv4Addr>,
        value: u32,
    ) -> Self {
        let name = name.into();
        self.segments.insert(
            name.clone(),
            SegmentRequest {
                name,
                segment_type,
                ip_address: ip_address.into_iter().collect(),
                value,
            },
        );
        self
    }

    pub fn segment_member(mut self, member: SegmentMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn access_port(mut self, port: AccessPort) -> Self {
        self.access_ports.push(port);
        self
    }

    pub fn network_port(mut self, port: NetworkPort) -> Self {
        self.network_ports.push(port);
        self
    }

    /// Create `uplink` before the tenant's network ports and delete it
    /// after the tenant.
    pub fn uplink_segment(mut self, uplink: UplinkSegment) -> Self {
        self.uplinks.push(uplink);
        self
    }

    /// Payload for the tenant itself.
    pub fn request(&self) -> TenantRequest {
        TenantRequest {
            name: self.name.clone(),
            kind: self.kind,
        }
    }

    /// Local construction checks. Nothing is sent if these fail.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::validation("tenant.name", "must not be empty"));
        }
        let referenced = self
            .members
            .iter()
            .map(|m| &m.segment)
            .chain(self.access_ports.iter().map(|p| &p.segment))
            .chain(self.network_ports.iter().map(|p| &p.segment));
        for segment in referenced {
            if !self.segments.contains_key(segment) {
                return Err(CoreError::validation(
                    "tenant.segment",
                    format!("'{segment}' is referenced before it is declared on '{}'", self.name),
                ));
            }
        }
        if let Some(member) = self.members.iter().find(|m| m.ports.is_empty()) {
            return Err(CoreError::validation(
                "segment_member.ports",
                format!("member {} of '{}' has no ports", member.device_id, member.segment),
            ));
        }
        Ok(())
    }

    /// Push tenant, uplinks, segments, members, then ports. Anything
    /// created before a failure is deleted again.
    pub async fn build(self, fabric: &Fabric) -> Result<TenantHandle, CoreError> {
        self.validate()?;
        let client = fabric.client();

        client.create_tenant(&self.request()).await?;
        let handle = TenantHandle {
            name: self.name.clone(),
            kind: self.kind,
            segments: Arc::new(Mutex::new(Vec::new())),
            uplinks: Arc::new(Mutex::new(Vec::new())),
            live: Liveness::default(),
        };

        if let Err(e) = self.push_children(fabric, &handle).await {
            warn!(tenant = %self.name, error = %e, "tenant build failed, rolling back");
            if let Err(rollback) = handle.destroy(fabric).await {
                warn!(tenant = %self.name, error = %rollback, "rollback incomplete");
            }
            return Err(e);
        }

        info!(
            tenant = %self.name,
            kind = %self.kind,
            segments = self.segments.len(),
            "tenant built"
        );
        Ok(handle)
    }

    async fn push_children(&self, fabric: &Fabric, handle: &TenantHandle) -> Result<(), CoreError> {
        let client = fabric.client();

        for uplink in &self.uplinks {
            let built = uplink.clone().build(fabric).await?;
            lock(&handle.uplinks).push(built);
        }
        for segment in self.segments.values() {
            client.create_segment(&self.name, segment).await?;
            lock(&handle.segments).push(segment.name.clone());
        }
        for member in &self.members {
            client
                .add_segment_member(
                    &self.name,
                    &member.segment,
                    &member.device_id,
                    &member.request(),
                )
                .await?;
        }
        for port in &self.access_ports {
            client
                .add_access_port(&self.name, &port.segment, &port.request)
                .await?;
        }
        for port in &self.network_ports {
            client
                .add_network_port(&self.name, &port.segment, &port.request)
                .await?;
        }
        Ok(())
    }

    /// Push the tenant expecting the controller to refuse it, and check
    /// the tenant list did not change. Returns the rejection.
    pub async fn build_not_success(self, fabric: &Fabric) -> Result<CoreError, CoreError> {
        let before = tenant_names(fabric).await?;
        let result = fabric.client().create_tenant(&self.request()).await;
        if result.is_ok() {
            fabric.client().delete_tenant(&self.name).await.ok();
        }
        let rejection = expect_rejection(result.map_err(CoreError::from), KIND, &self.name)?;
        let after = tenant_names(fabric).await?;
        check_unchanged(&before, &after)?;
        Ok(rejection)
    }
}

async fn tenant_names(fabric: &Fabric) -> Result<Vec<String>, CoreError> {
    let mut names: Vec<String> = fabric.tenants().await?.into_iter().map(|t| t.name).collect();
    names.sort();
    Ok(names)
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Handle ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TenantHandle {
    name: String,
    kind: TenantKind,
    segments: Arc<Mutex<Vec<String>>>,
    uplinks: Arc<Mutex<Vec<UplinkSegmentHandle>>>,
    live: Liveness,
}

impl TenantHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TenantKind {
        self.kind
    }

    /// Segments created by this handle that still exist.
    pub fn segments(&self) -> Vec<String> {
        lock(&self.segments).clone()
    }

    /// Delete one segment ahead of the tenant.
    pub async fn delete_segment(&self, fabric: &Fabric, segment: &str) -> Result<(), CoreError> {
        if self.live.is_destroyed() {
            return Err(CoreError::AlreadyDestroyed {
                kind: KIND,
                name: self.name.clone(),
            });
        }
        fabric.client().delete_segment(&self.name, segment).await?;
        lock(&self.segments).retain(|s| s != segment);
        info!(tenant = %self.name, segment, "segment deleted");
        Ok(())
    }
}

#[async_trait]
impl Destroy for TenantHandle {
    /// Segments in reverse creation order, then the tenant, then any
    /// uplink segments built with it.
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with(KIND, &self.name, || async {
                let client = fabric.client();
                loop {
                    let Some(segment) = lock(&self.segments).last().cloned() else {
                        break;
                    };
                    client.delete_segment(&self.name, &segment).await?;
                    lock(&self.segments).pop();
                }
                client.delete_tenant(&self.name).await?;

                let uplinks: Vec<UplinkSegmentHandle> =
                    lock(&self.uplinks).drain(..).rev().collect();
                for uplink in uplinks {
                    uplink.destroy(fabric).await?;
                }
                Ok(())
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("tenant {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_on_undeclared_segment_fails_locally() {
        let tenant = Tenant::new("t1")
            .segment("s1", SegmentType::Vlan, [], 10)
            .segment_member(SegmentMember::new("s2", "of:1").ports([Port::new(46)]));
        assert!(matches!(
            tenant.validate(),
            Err(CoreError::Validation { field, .. }) if field == "tenant.segment"
        ));
    }

    #[test]
    fn member_ports_render_tagging() {
        let member = SegmentMember::new("s1", "of:1")
            .ports([Port::new(46), Port::new(49).tagged(true)]);
        assert_eq!(member.request().ports, vec!["46/untag", "49/tag"]);
    }

    #[test]
    fn redeclared_segment_replaces_in_place() {
        let tenant = Tenant::new("t1")
            .segment("s1", SegmentType::Vlan, [], 10)
            .segment("s2", SegmentType::Vlan, [], 20)
            .segment("s1", SegmentType::Vxlan, [], 1000);
        let names: Vec<&String> = tenant.segments.keys().collect();
        assert_eq!(names, ["s1", "s2"]);
        assert_eq!(tenant.segments["s1"].segment_type, SegmentType::Vxlan);
    }

    #[test]
    fn system_tenant_kind() {
        assert_eq!(Tenant::system("system").request().kind, TenantKind::System);
    }
}
