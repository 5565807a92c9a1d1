// PPPoE intermediate agent: per-device delegate list, enable flag, and
// per-port circuit/remote id insertion.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use fabcheck_api::models::{PppoeiaDelegates, PppoeiaPortRequest};
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;

const KIND: &str = "pppoe ia";

/// Per-port agent settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortIntermediateAgent {
    host_port: bool,
    strip_vendor: bool,
    circuit_id: String,
    remote_id: String,
}

impl PortIntermediateAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriber-facing port: discovery frames arriving here get the
    /// vendor tag inserted.
    pub fn host_port(mut self, host_port: bool) -> Self {
        self.host_port = host_port;
        self
    }

    /// Strip the vendor tag from frames leaving toward subscribers.
    pub fn strip_vendor(mut self, strip: bool) -> Self {
        self.strip_vendor = strip;
        self
    }

    pub fn circuit_id(mut self, id: impl Into<String>) -> Self {
        self.circuit_id = id.into();
        self
    }

    pub fn remote_id(mut self, id: impl Into<String>) -> Self {
        self.remote_id = id.into();
        self
    }

    pub fn request(&self) -> PppoeiaPortRequest {
        PppoeiaPortRequest {
            host_port: self.host_port,
            strip_vendor: self.strip_vendor,
            circuit_id: self.circuit_id.clone(),
            remote_id: self.remote_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pppoeia {
    device_id: String,
    delegates: Vec<String>,
}

impl Pppoeia {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            delegates: Vec::new(),
        }
    }

    /// Delegate device ids, e.g. `rest:192.168.40.176:80/2`.
    pub fn delegates<I, S>(mut self, delegates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.delegates.extend(delegates.into_iter().map(Into::into));
        self
    }

    fn body(&self) -> PppoeiaDelegates {
        PppoeiaDelegates {
            delegate_devices: self.delegates.clone(),
        }
    }

    /// Append the delegates to whatever the device already has.
    pub async fn build(self, fabric: &Fabric) -> Result<PppoeiaHandle, CoreError> {
        fabric
            .client()
            .add_pppoeia_delegates(&self.device_id, &self.body())
            .await?;
        info!(device = %self.device_id, delegates = ?self.delegates, "pppoe ia delegates added");
        Ok(PppoeiaHandle::new(self.device_id))
    }

    /// Replace the device's delegate list with this one.
    pub async fn put_delegates(self, fabric: &Fabric) -> Result<PppoeiaHandle, CoreError> {
        fabric
            .client()
            .replace_pppoeia_delegates(&self.device_id, &self.body())
            .await?;
        info!(device = %self.device_id, delegates = ?self.delegates, "pppoe ia delegates replaced");
        Ok(PppoeiaHandle::new(self.device_id))
    }
}

#[derive(Debug, Clone)]
pub struct PppoeiaHandle {
    device_id: String,
    enabled_here: Arc<AtomicBool>,
    live: Liveness,
}

impl PppoeiaHandle {
    fn new(device_id: String) -> Self {
        Self {
            device_id,
            enabled_here: Arc::new(AtomicBool::new(false)),
            live: Liveness::default(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn ensure_live(&self) -> Result<(), CoreError> {
        if self.live.is_destroyed() {
            return Err(CoreError::AlreadyDestroyed {
                kind: KIND,
                name: self.device_id.clone(),
            });
        }
        Ok(())
    }

    pub async fn set_status(&self, fabric: &Fabric, enabled: bool) -> Result<(), CoreError> {
        self.ensure_live()?;
        fabric
            .client()
            .set_pppoeia_status(&self.device_id, enabled)
            .await?;
        self.enabled_here.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    pub async fn set_port(
        &self,
        fabric: &Fabric,
        port: u32,
        agent: &PortIntermediateAgent,
    ) -> Result<(), CoreError> {
        self.ensure_live()?;
        Ok(fabric
            .client()
            .set_pppoeia_port(&self.device_id, port, &agent.request())
            .await?)
    }

    pub async fn delete_delegate(&self, fabric: &Fabric, index: usize) -> Result<(), CoreError> {
        self.ensure_live()?;
        Ok(fabric
            .client()
            .delete_pppoeia_delegate(&self.device_id, index)
            .await?)
    }

    /// Delegates the controller currently reports for this device's agent.
    pub async fn delegates(&self, fabric: &Fabric) -> Result<Vec<String>, CoreError> {
        Ok(fabric.pppoeia_devices().await?.delegate_devices)
    }

    /// Enable flag the controller reports for this device.
    pub async fn status(&self, fabric: &Fabric) -> Result<Option<bool>, CoreError> {
        Ok(fabric
            .pppoeia_devices()
            .await?
            .devices
            .into_iter()
            .find(|d| d.device_id == self.device_id)
            .map(|d| d.status))
    }
}

#[async_trait]
impl Destroy for PppoeiaHandle {
    /// Clear the delegate list, and disable the agent if this handle
    /// enabled it.
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with(KIND, &self.device_id, || async {
                let client = fabric.client();
                client
                    .replace_pppoeia_delegates(&self.device_id, &PppoeiaDelegates::default())
                    .await?;
                if self.enabled_here.swap(false, Ordering::SeqCst) {
                    client.set_pppoeia_status(&self.device_id, false).await?;
                }
                Ok(())
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("pppoe ia {}", self.device_id)
    }
}
