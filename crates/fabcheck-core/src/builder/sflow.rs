// sFlow per-device configuration.
//
// The controller enforces value ranges, refuses a push onto a device that
// already has a configuration, and keeps the previous configuration when a
// push is refused. `SflowLimits` mirrors the ranges for local
// reasoning, but `build` never pre-checks: boundary tests need the push to
// reach the controller.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use async_trait::async_trait;
use fabcheck_api::models::SflowRequest;
use tracing::info;

use super::{Destroy, Liveness, check_unchanged, expect_rejection};
use crate::error::CoreError;
use crate::fabric::Fabric;

const KIND: &str = "sflow";

/// Accepted ranges observed on the controller.
#[derive(Debug, Clone, Copy)]
pub struct SflowLimits;

impl SflowLimits {
    pub const POLLING_INTERVAL: RangeInclusive<u32> = 1..=10_000_000;
    pub const SAMPLE_RATE: RangeInclusive<u32> = 256..=16_777_215;
    pub const MAX_HEADER_LENGTH: RangeInclusive<u32> = 64..=256;
    pub const MAX_PAYLOAD_LENGTH: RangeInclusive<u32> = 200..=1500;
    pub const DURATION: RangeInclusive<u32> = 30..=10_000_000;

    /// First out-of-range field, if any.
    pub fn check(request: &SflowRequest) -> Result<(), CoreError> {
        let fields = [
            ("polling_interval", request.polling_interval, Self::POLLING_INTERVAL),
            ("sample_rate", request.sample_rate, Self::SAMPLE_RATE),
            ("max_header_length", request.max_header_length, Self::MAX_HEADER_LENGTH),
            ("max_payload_length", request.max_payload_length, Self::MAX_PAYLOAD_LENGTH),
            ("duration", request.duration, Self::DURATION),
        ];
        for (name, value, range) in fields {
            if !range.contains(&value) {
                return Err(CoreError::validation(
                    format!("sflow.{name}"),
                    format!("{value} outside {}..={}", range.start(), range.end()),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sflow {
    device_id: String,
    request: SflowRequest,
}

impl Sflow {
    /// Defaults are the lowest accepted values, with a full-size payload
    /// and header.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            request: SflowRequest {
                collector_ip: Ipv4Addr::UNSPECIFIED,
                max_payload_length: 1500,
                max_header_length: 256,
                polling_interval: 1,
                sample_rate: 256,
                port: Vec::new(),
                duration: 30,
            },
        }
    }

    pub fn collector_ip(mut self, ip: Ipv4Addr) -> Self {
        self.request.collector_ip = ip;
        self
    }

    pub fn max_payload_length(mut self, len: u32) -> Self {
        self.request.max_payload_length = len;
        self
    }

    pub fn max_header_length(mut self, len: u32) -> Self {
        self.request.max_header_length = len;
        self
    }

    pub fn polling_interval(mut self, interval: u32) -> Self {
        self.request.polling_interval = interval;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.request.sample_rate = rate;
        self
    }

    pub fn ports(mut self, ports: impl IntoIterator<Item = u32>) -> Self {
        self.request.port.extend(ports);
        self
    }

    pub fn duration(mut self, duration: u32) -> Self {
        self.request.duration = duration;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn request(&self) -> &SflowRequest {
        &self.request
    }

    /// Whether every value sits inside [`SflowLimits`].
    pub fn within_limits(&self) -> bool {
        SflowLimits::check(&self.request).is_ok()
    }

    pub async fn build(self, fabric: &Fabric) -> Result<SflowHandle, CoreError> {
        fabric
            .client()
            .set_sflow(&self.device_id, &self.request)
            .await?;
        info!(device = %self.device_id, collector = %self.request.collector_ip, "sflow built");
        Ok(SflowHandle {
            device_id: self.device_id,
            live: Liveness::default(),
        })
    }

    /// Push expecting a refusal; the stored configuration for the device
    /// must be exactly what it was before.
    pub async fn build_not_success(self, fabric: &Fabric) -> Result<CoreError, CoreError> {
        let before = fabric.sflow_by_device(&self.device_id).await?;
        let result = fabric
            .client()
            .set_sflow(&self.device_id, &self.request)
            .await
            .map_err(CoreError::from);
        let rejection = expect_rejection(result, KIND, &self.device_id)?;
        let after = fabric.sflow_by_device(&self.device_id).await?;
        check_unchanged(&before, &after)?;
        Ok(rejection)
    }
}

#[derive(Debug, Clone)]
pub struct SflowHandle {
    device_id: String,
    live: Liveness,
}

impl SflowHandle {
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[async_trait]
impl Destroy for SflowHandle {
    /// Deletes and reads back; leftover configuration is an error.
    async fn destroy(&self, fabric: &Fabric) -> Result<(), CoreError> {
        self.live
            .destroy_with(KIND, &self.device_id, || fabric.delete_sflow(&self.device_id))
            .await
    }

    fn is_destroyed(&self) -> bool {
        self.live.is_destroyed()
    }

    fn describe(&self) -> String {
        format!("sflow {}", self.device_id)
    }
}
