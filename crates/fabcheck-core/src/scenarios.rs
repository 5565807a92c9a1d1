// Ready-made scenarios for smoke checks against a live controller.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use fabcheck_api::models::SegmentType;

use crate::builder::{Destroy, Sflow, Tenant, TenantHandle};
use crate::case::{CaseEnv, Scenario, Teardown};
use crate::error::CoreError;

fn check(ok: bool, message: impl FnOnce() -> String) -> Result<(), CoreError> {
    if ok {
        Ok(())
    } else {
        Err(CoreError::CheckFailed(message()))
    }
}

// ── Tenant round trip ────────────────────────────────────────────────

/// Create a tenant with one VLAN segment, read both back, delete the
/// tenant, and confirm it is gone.
#[derive(Debug)]
pub struct TenantRoundTrip {
    tenant: String,
    segment: String,
    vlan: u32,
    handle: Option<TenantHandle>,
}

impl TenantRoundTrip {
    pub fn new(tenant: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            segment: "s1".into(),
            vlan: 10,
            handle: None,
        }
    }

    pub fn segment(mut self, name: impl Into<String>, vlan: u32) -> Self {
        self.segment = name.into();
        self.vlan = vlan;
        self
    }
}

#[async_trait]
impl Scenario for TenantRoundTrip {
    fn name(&self) -> String {
        format!("tenant-roundtrip({})", self.tenant)
    }

    async fn configure(&mut self, env: &CaseEnv, teardown: &mut Teardown) -> Result<(), CoreError> {
        check(!env.fabric.tenant_exists(&self.tenant).await?, || {
            format!("tenant {} already exists", self.tenant)
        })?;
        let handle = Tenant::new(&self.tenant)
            .segment(
                &self.segment,
                SegmentType::Vlan,
                [Ipv4Addr::new(192, 168, 10, 1)],
                self.vlan,
            )
            .build(&env.fabric)
            .await?;
        self.handle = Some(teardown.register(handle));
        Ok(())
    }

    async fn verify(&mut self, env: &CaseEnv) -> Result<(), CoreError> {
        let fabric = &env.fabric;
        check(fabric.tenant_exists(&self.tenant).await?, || {
            format!("tenant {} not listed after build", self.tenant)
        })?;
        check(fabric.segment_exists(&self.tenant, &self.segment).await?, || {
            format!("segment {}/{} not stored", self.tenant, self.segment)
        })?;

        if let Some(handle) = &self.handle {
            handle.destroy(fabric).await?;
        }
        check(!fabric.tenant_exists(&self.tenant).await?, || {
            format!("tenant {} still listed after delete", self.tenant)
        })
    }
}

// ── sFlow boundary ───────────────────────────────────────────────────

/// Configure sFlow with the smallest header length, then push a second
/// configuration and an out-of-range one. Both must be refused and the
/// stored header length must stay at its first value.
#[derive(Debug)]
pub struct SflowBoundary {
    device_id: Option<String>,
    collector: Ipv4Addr,
    first_header: u32,
}

impl SflowBoundary {
    /// Runs against the first leaf unless [`SflowBoundary::device`] is set.
    pub fn new(collector: Ipv4Addr) -> Self {
        Self {
            device_id: None,
            collector,
            first_header: 64,
        }
    }

    pub fn device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    fn resolve_device(&self, env: &CaseEnv) -> Result<String, CoreError> {
        match &self.device_id {
            Some(id) => Ok(id.clone()),
            None => Ok(env.topology.leaf(0)?.id.clone()),
        }
    }

    fn sflow(&self, device: &str, header: u32) -> Sflow {
        Sflow::new(device)
            .collector_ip(self.collector)
            .max_header_length(header)
    }
}

#[async_trait]
impl Scenario for SflowBoundary {
    fn name(&self) -> String {
        "sflow-boundary".into()
    }

    async fn configure(&mut self, env: &CaseEnv, teardown: &mut Teardown) -> Result<(), CoreError> {
        let device = self.resolve_device(env)?;
        let handle = self.sflow(&device, self.first_header).build(&env.fabric).await?;
        teardown.register(handle);
        self.device_id = Some(device);
        Ok(())
    }

    async fn verify(&mut self, env: &CaseEnv) -> Result<(), CoreError> {
        let device = self.resolve_device(env)?;
        for header in [256, 257] {
            self.sflow(&device, header)
                .build_not_success(&env.fabric)
                .await?;
        }
        let stored = env
            .fabric
            .sflow_by_device(&device)
            .await?
            .ok_or_else(|| CoreError::CheckFailed(format!("no sflow stored for {device}")))?;
        check(stored.max_header_length == self.first_header, || {
            format!(
                "max header length is {} after rejected pushes, expected {}",
                stored.max_header_length, self.first_header
            )
        })
    }
}
