// Uplink segments: fabric-wide L3 hand-off from a leaf toward a spine,
// referenced by name from tenant network ports.

use std::net::Ipv4Addr;

use async_trait::async_trait;
use fabcheck_api::models::UplinkSegmentRequest;
use ipnetwork::Ipv4Network;
use tracing::info;

use super::{Destroy, Liveness};
use crate::error::CoreError;
use crate::fabric::Fabric;
use crate::model::{MacAddress, Port};

const KIND: &str = "uplink segment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkSegment {
    name: String,
    device_id: Option<String>,
    vlan: Option<u16>,
    ports: Vec<Port>,
    gateway: Option<Ipv4Addr>,
    gateway_mac: Option<MacAddress>,
    ip_address: Option<Ipv4Network>,
}

impl UplinkSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            device_id: None,
            vlan: None,
            ports: Vec::new(),
            gateway: None,
            gateway_mac: None,
            ip_address: None,
        }
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn vlan(mut self, vlan: u16) -> Self {
        self.vlan = Some(vlan);
        self
    }

    pub fn ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.ports.extend(ports);
        self
    }

    pub fn gateway(mut self, gateway: Ipv4Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn gateway_mac(mut self, mac: MacAddress) -> Self {
        self.gateway_mac = Some(mac);
        self
    }

    /// Interface address with prefix, e.g. `192.168.200.1/24`.
    pub fn ip_address(mut self, cidr: Ipv4Network) -> Self {
        self.ip_address = Some(cidr);
        self
    }

    pub fn request(&self) -> Result<UplinkSegmentRequest, CoreError> {
        let missing =
            |field: &str| CoreError::validation(format!("uplink_segment.{field}"), "required");
        Ok(UplinkSegmentRequest {
            name: self.name.clone(),
            device_id: self.device_id.clone().ok_or_else(|| missing("device_id"))?,
            vlan: self.vlan.ok_or_else(|| missing("vlan"))?,
            ports: self.ports.iter().map(Port::name).collect(),
            gateway: self.gateway.ok_or_else(|| missing("gateway"))?,
            gateway_mac: self
                .gateway_mac
                .ok_or_else(|| missing("gateway_mac"))?
                .to_string(),
            ip_address: self
                .ip_address
                .ok_or_else(|| missing("ip_address"))?
                .to_string(),
        })
    }

    pub async fn build(self, fabric: &Fabric) -> Result<UplinkSegmentHandle, CoreError> {
        let request = self.request()?;
        fabric.client().create_uplink_segment(&request).await?;
        info!(
            name = %self.name,
            device = %request.device_id,
            vlan = request.vlan,
            "uplink segment built"
        );
        Ok(UplinkSegmentHandle {
            name: self.name,
            live: Liveness::default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct UplinkSegmentHandle {
    name: String,
    live: Liveness,
}

impl UplinkSegmentHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Destroy for UplinkSegmentHandle {
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with(KIND, &self.name, || async {
                Ok(fabric.client().delete_uplink_segment(&self.name).await?)
            })
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("uplink segment {}", self.name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn request_renders_controller_strings() {
        let req = UplinkSegment::new("leaf0spine0")
            .device_id("of:11")
            .vlan(200)
            .ports([Port::new(49).tagged(true)])
            .gateway(Ipv4Addr::new(192, 168, 200, 2))
            .gateway_mac("cc:37:ab:00:00:01".parse().unwrap())
            .ip_address("192.168.200.1/24".parse().unwrap())
            .request()
            .unwrap();
        assert_eq!(req.ports, vec!["49/tag"]);
        assert_eq!(req.ip_address, "192.168.200.1/24");
        assert_eq!(req.gateway_mac, "cc:37:ab:00:00:01");
    }

    #[test]
    fn missing_vlan_is_validation_error() {
        let err = UplinkSegment::new("u").device_id("of:1").request().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation { field, .. } if field == "uplink_segment.vlan"
        ));
    }
}
