// ── Dataplane abstraction ──
//
// Frame injection and capture on logical port numbers. The physical
// transport (raw sockets, a traffic generator, a remote agent) lives
// behind this trait; the verifier only ever polls it.

mod loopback;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::time::Instant;

pub use loopback::{Forwarder, LoopbackDataplane};

/// A frame observed on a port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub port: u32,
    pub data: Bytes,
    pub captured_at: Instant,
}

#[derive(Debug, Error)]
pub enum DataplaneError {
    #[error("Port {port} is not part of this dataplane")]
    UnknownPort { port: u32 },

    #[error("Dataplane I/O error on port {port}: {message}")]
    Io { port: u32, message: String },

    #[error("Dataplane is closed")]
    Closed,
}

/// Inject and capture frames on logical ports.
///
/// `poll` must not block: it drains whatever has arrived on the port since
/// the previous call and returns immediately.
#[async_trait]
pub trait Dataplane: Send + Sync {
    async fn send(&self, port: u32, frame: &[u8]) -> Result<(), DataplaneError>;

    async fn poll(&self, port: u32) -> Result<Vec<CapturedFrame>, DataplaneError>;

    /// Discard everything queued on every port.
    async fn flush(&self) -> Result<(), DataplaneError>;

    fn ports(&self) -> Vec<u32>;
}
