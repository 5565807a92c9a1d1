// sFlow endpoints
//
// Requests are snake_case, responses camelCase. A device with no sFlow
// configuration answers `{}` rather than 404.

use tracing::debug;

use crate::client::FabricClient;
use crate::error::Error;
use crate::models::{SflowList, SflowRecord, SflowRequest};

impl FabricClient {
    /// `GET sflow/v1`
    pub async fn list_sflow(&self) -> Result<SflowList, Error> {
        self.get("sflow/v1").await
    }

    /// `GET sflow/v1/{device}`, `None` when nothing is configured.
    pub async fn sflow(&self, device: &str) -> Result<Option<SflowRecord>, Error> {
        self.get_optional(&format!("sflow/v1/{device}")).await
    }

    /// `POST sflow/v1/{device}`
    ///
    /// Out-of-range values are rejected and the stored configuration is
    /// left as it was.
    pub async fn set_sflow(&self, device: &str, req: &SflowRequest) -> Result<(), Error> {
        debug!(
            device,
            collector = %req.collector_ip,
            sample_rate = req.sample_rate,
            polling_interval = req.polling_interval,
            "configuring sflow"
        );
        self.post(&format!("sflow/v1/{device}"), req).await
    }

    /// `DELETE sflow/v1/{device}`
    pub async fn delete_sflow(&self, device: &str) -> Result<(), Error> {
        debug!(device, "deleting sflow");
        self.delete(&format!("sflow/v1/{device}")).await
    }
}
