// In-memory dataplane.
//
// Every injected frame is handed to a forwarder closure that decides what
// comes out where. Frames become visible to `poll` once the configured
// delay has elapsed (on tokio's clock, so paused-time tests stay exact).

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::Instant;
use tracing::trace;

use super::{CapturedFrame, Dataplane, DataplaneError};

/// Maps `(ingress port, frame)` to the frames emitted in response.
pub type Forwarder = Arc<dyn Fn(u32, &[u8]) -> Vec<(u32, Bytes)> + Send + Sync>;

#[derive(Default)]
struct Queues {
    rx: BTreeMap<u32, VecDeque<CapturedFrame>>,
    injected: Vec<(u32, Bytes)>,
}

pub struct LoopbackDataplane {
    ports: Vec<u32>,
    forwarder: Forwarder,
    delay: Duration,
    queues: Mutex<Queues>,
}

impl std::fmt::Debug for LoopbackDataplane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackDataplane")
            .field("ports", &self.ports)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl LoopbackDataplane {
    pub fn new(ports: impl IntoIterator<Item = u32>, forwarder: Forwarder) -> Self {
        let ports: Vec<u32> = ports.into_iter().collect();
        let rx = ports.iter().map(|p| (*p, VecDeque::new())).collect();
        Self {
            ports,
            forwarder,
            delay: Duration::ZERO,
            queues: Mutex::new(Queues {
                rx,
                injected: Vec::new(),
            }),
        }
    }

    /// A dataplane that swallows every frame.
    pub fn silent(ports: impl IntoIterator<Item = u32>) -> Self {
        Self::new(ports, Arc::new(|_, _| Vec::new()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Frames sent so far, in order.
    pub fn injected(&self) -> Vec<(u32, Bytes)> {
        self.lock().injected.clone()
    }

    /// Place a frame directly on a port's receive queue, bypassing the
    /// forwarder.
    pub fn deliver(&self, port: u32, frame: Bytes) -> Result<(), DataplaneError> {
        let ready = Instant::now() + self.delay;
        let mut queues = self.lock();
        let queue = queues
            .rx
            .get_mut(&port)
            .ok_or(DataplaneError::UnknownPort { port })?;
        queue.push_back(CapturedFrame {
            port,
            data: frame,
            captured_at: ready,
        });
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_port(&self, port: u32) -> Result<(), DataplaneError> {
        if self.ports.contains(&port) {
            Ok(())
        } else {
            Err(DataplaneError::UnknownPort { port })
        }
    }
}

#[async_trait]
impl Dataplane for LoopbackDataplane {
    async fn send(&self, port: u32, frame: &[u8]) -> Result<(), DataplaneError> {
        self.check_port(port)?;
        let outputs = (self.forwarder)(port, frame);
        trace!(port, len = frame.len(), outputs = outputs.len(), "loopback send");

        self.lock()
            .injected
            .push((port, Bytes::copy_from_slice(frame)));
        for (egress, data) in outputs {
            self.deliver(egress, data)?;
        }
        Ok(())
    }

    async fn poll(&self, port: u32) -> Result<Vec<CapturedFrame>, DataplaneError> {
        self.check_port(port)?;
        let now = Instant::now();
        let mut queues = self.lock();
        let queue = queues
            .rx
            .get_mut(&port)
            .ok_or(DataplaneError::UnknownPort { port })?;

        let mut ready = Vec::new();
        while queue.front().is_some_and(|f| f.captured_at <= now) {
            if let Some(frame) = queue.pop_front() {
                ready.push(frame);
            }
        }
        Ok(ready)
    }

    async fn flush(&self) -> Result<(), DataplaneError> {
        let mut queues = self.lock();
        for queue in queues.rx.values_mut() {
            queue.clear();
        }
        Ok(())
    }

    fn ports(&self) -> Vec<u32> {
        self.ports.clone()
    }
}
