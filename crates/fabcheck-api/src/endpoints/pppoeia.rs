// PPPoE intermediate-agent endpoints

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{
    PppoeiaDelegates, PppoeiaOverview, PppoeiaPortList, PppoeiaPortRequest, PppoeiaStatsList,
    PppoeiaStatusRequest,
};

impl FabricClient {
    /// `GET pppoeia/v1`: delegate list plus per-device enable status.
    pub async fn pppoeia(&self) -> Result<PppoeiaOverview, Error> {
        self.get("pppoeia/v1").await
    }

    /// `POST pppoeia/v1/{device}/delegates` (appends to the delegate list)
    pub async fn add_pppoeia_delegates(
        &self,
        device: &str,
        req: &PppoeiaDelegates,
    ) -> Result<(), Error> {
        debug!(device, delegates = ?req.delegate_devices, "adding pppoeia delegates");
        self.post(&format!("pppoeia/v1/{device}/delegates"), req)
            .await
    }

    /// `PUT pppoeia/v1/{device}/delegates` (replaces the delegate list)
    pub async fn replace_pppoeia_delegates(
        &self,
        device: &str,
        req: &PppoeiaDelegates,
    ) -> Result<(), Error> {
        debug!(device, delegates = ?req.delegate_devices, "replacing pppoeia delegates");
        self.put(&format!("pppoeia/v1/{device}/delegates"), req)
            .await
    }

    /// `DELETE pppoeia/v1/{device}/delegates/{index}`
    pub async fn delete_pppoeia_delegate(&self, device: &str, index: usize) -> Result<(), Error> {
        debug!(device, index, "deleting pppoeia delegate");
        self.delete(&format!("pppoeia/v1/{device}/delegates/{index}"))
            .await
    }

    /// `PUT pppoeia/v1/{device}`
    pub async fn set_pppoeia_status(&self, device: &str, enabled: bool) -> Result<(), Error> {
        debug!(device, enabled, "setting pppoeia status");
        self.put(
            &format!("pppoeia/v1/{device}"),
            &PppoeiaStatusRequest { status: enabled },
        )
        .await
    }

    /// `PUT pppoeia/v1/{device}/ports/{port}`
    pub async fn set_pppoeia_port(
        &self,
        device: &str,
        port: u32,
        req: &PppoeiaPortRequest,
    ) -> Result<(), Error> {
        debug!(device, port, circuit_id = %req.circuit_id, "setting pppoeia port");
        self.put(&format!("pppoeia/v1/{device}/ports/{port}"), req)
            .await
    }

    /// `GET pppoeia/v1/ports`
    pub async fn pppoeia_ports(&self) -> Result<PppoeiaPortList, Error> {
        self.get("pppoeia/v1/ports").await
    }

    /// `GET pppoeia/v1/ports/{device}`
    pub async fn pppoeia_ports_by_device(&self, device: &str) -> Result<PppoeiaPortList, Error> {
        self.get(&format!("pppoeia/v1/ports/{device}")).await
    }

    /// `GET pppoeia/v1/stats`
    pub async fn pppoeia_stats(&self) -> Result<PppoeiaStatsList, Error> {
        self.get("pppoeia/v1/stats").await
    }

    /// `GET pppoeia/v1/stats/{device}`
    pub async fn pppoeia_stats_by_device(&self, device: &str) -> Result<PppoeiaStatsList, Error> {
        self.get(&format!("pppoeia/v1/stats/{device}")).await
    }
}
