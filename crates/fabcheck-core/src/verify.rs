// ── Packet verification ──
//
// Positive checks poll a port until a matching frame shows up or the
// timeout passes. Negative checks watch for the whole quiescence window;
// there is no early success for "nothing arrived".
//
// Frames that were polled but not consumed by a match stay in a per-port
// backlog, so a later `verify_no_other_packets` still sees them.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::dataplane::{CapturedFrame, Dataplane, DataplaneError};
use crate::packet::{IgnoreMask, diff, frames_match, hex_dump};
use crate::timing::Timing;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Expected frame never arrived. `observed` holds every frame seen on
    /// the port in the meantime; `report` renders them with a diff against
    /// the closest one.
    #[error("Expected packet not received on port {port} within {waited_ms}ms\n{report}")]
    Missing {
        port: u32,
        waited_ms: u64,
        observed: Vec<CapturedFrame>,
        report: String,
    },

    #[error("Unexpected packet received on port {port}\n{report}")]
    Unexpected {
        port: u32,
        frame: CapturedFrame,
        report: String,
    },

    #[error("Expected exactly one copy on port {port}, received {count}")]
    Multiple { port: u32, count: usize },

    #[error(transparent)]
    Dataplane(#[from] DataplaneError),
}

/// Per-port outcome of [`Verifier::flood_and_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FloodCount {
    pub sent: usize,
    pub matched: usize,
    pub other: usize,
}

pub struct Verifier {
    dataplane: Arc<dyn Dataplane>,
    timing: Timing,
    backlog: Mutex<BTreeMap<u32, Vec<CapturedFrame>>>,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("ports", &self.dataplane.ports())
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    pub fn new(dataplane: Arc<dyn Dataplane>, timing: Timing) -> Self {
        Self {
            dataplane,
            timing,
            backlog: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn dataplane(&self) -> &Arc<dyn Dataplane> {
        &self.dataplane
    }

    pub async fn send(&self, port: u32, frame: &[u8]) -> Result<(), VerifyError> {
        trace!(port, len = frame.len(), "send");
        self.dataplane.send(port, frame).await?;
        Ok(())
    }

    /// Drop everything queued in the dataplane and in the backlog.
    pub async fn flush(&self) -> Result<(), VerifyError> {
        self.dataplane.flush().await?;
        self.lock().clear();
        Ok(())
    }

    // ── Positive checks ──────────────────────────────────────────────

    pub async fn verify_packet(
        &self,
        expected: &[u8],
        port: u32,
    ) -> Result<CapturedFrame, VerifyError> {
        self.verify_packet_masked(expected, port, &IgnoreMask::new())
            .await
    }

    pub async fn verify_packet_masked(
        &self,
        expected: &[u8],
        port: u32,
        mask: &IgnoreMask,
    ) -> Result<CapturedFrame, VerifyError> {
        let started = Instant::now();
        let deadline = started + self.timing.verify_timeout;

        loop {
            self.collect(port).await?;
            if let Some(frame) = self.take_match(port, expected, mask) {
                debug!(port, "expected packet received");
                return Ok(frame);
            }
            if Instant::now() >= deadline {
                let observed = self.backlog_for(port);
                return Err(VerifyError::Missing {
                    port,
                    waited_ms: elapsed_ms(started),
                    report: missing_report(expected, &observed, mask),
                    observed,
                });
            }
            sleep(self.timing.poll_interval).await;
        }
    }

    /// Poll `port` until a frame accepted by `accept` arrives, or the
    /// positive timeout passes. Non-matching frames stay in the backlog.
    pub async fn receive_matching(
        &self,
        port: u32,
        accept: impl Fn(&[u8]) -> bool,
    ) -> Result<Option<CapturedFrame>, VerifyError> {
        let deadline = Instant::now() + self.timing.verify_timeout;
        loop {
            self.collect(port).await?;
            {
                let mut backlog = self.lock();
                if let Some(frames) = backlog.get_mut(&port) {
                    if let Some(idx) = frames.iter().position(|f| accept(&f.data)) {
                        return Ok(Some(frames.remove(idx)));
                    }
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.timing.poll_interval).await;
        }
    }

    /// Every expectation must be met; each entry may carry a different
    /// frame (per-branch rewrites).
    pub async fn verify_each(
        &self,
        expectations: &[(u32, &[u8])],
        mask: &IgnoreMask,
    ) -> Result<(), VerifyError> {
        for (port, expected) in expectations {
            self.verify_packet_masked(expected, *port, mask).await?;
        }
        Ok(())
    }

    /// Fan-out check: exactly one copy of `expected` on every port in
    /// `with_ports`, none on any port in `without_ports`.
    pub async fn verify_packets(
        &self,
        expected: &[u8],
        with_ports: &[u32],
        without_ports: &[u32],
        mask: &IgnoreMask,
    ) -> Result<(), VerifyError> {
        for port in with_ports {
            self.verify_packet_masked(expected, *port, mask).await?;
        }

        self.watch(with_ports.iter().chain(without_ports)).await?;

        for port in with_ports {
            let extra = self.count_matches(*port, expected, mask);
            if extra > 0 {
                return Err(VerifyError::Multiple {
                    port: *port,
                    count: extra + 1,
                });
            }
        }
        for port in without_ports {
            if let Some(frame) = self.take_match(*port, expected, mask) {
                return Err(unexpected(*port, frame));
            }
        }
        Ok(())
    }

    // ── Negative checks ──────────────────────────────────────────────

    /// Watch `port` for the full negative window; fail if `unexpected`
    /// (under `mask`) shows up.
    pub async fn verify_no_packet(
        &self,
        unexpected_frame: &[u8],
        port: u32,
        mask: &IgnoreMask,
    ) -> Result<(), VerifyError> {
        self.watch([port].iter()).await?;
        match self.take_match(port, unexpected_frame, mask) {
            Some(frame) => Err(unexpected(port, frame)),
            None => Ok(()),
        }
    }

    /// Fail if anything at all is pending on any port after the negative
    /// window.
    pub async fn verify_no_other_packets(&self) -> Result<(), VerifyError> {
        let ports = self.dataplane.ports();
        self.watch(ports.iter()).await?;

        let mut backlog = self.lock();
        for (port, frames) in backlog.iter_mut() {
            if !frames.is_empty() {
                let frame = frames.remove(0);
                return Err(unexpected(*port, frame));
            }
        }
        Ok(())
    }

    // ── Statistical ──────────────────────────────────────────────────

    /// Send `frame` on `port` `iterations` times, `interval` apart, then
    /// count frames on `capture_port` accepted by `predicate`. Used for
    /// sampling mechanisms where a fraction of traffic is reported.
    pub async fn flood_and_count(
        &self,
        port: u32,
        frame: &[u8],
        iterations: usize,
        interval: Duration,
        capture_port: u32,
        predicate: impl Fn(&[u8]) -> bool,
    ) -> Result<FloodCount, VerifyError> {
        let mut count = FloodCount::default();
        for _ in 0..iterations {
            self.send(port, frame).await?;
            count.sent += 1;
            if !interval.is_zero() {
                sleep(interval).await;
            }
            self.collect(capture_port).await?;
        }
        self.watch([capture_port].iter()).await?;

        let frames = std::mem::take(self.lock().entry(capture_port).or_default());
        for captured in frames {
            if predicate(&captured.data) {
                count.matched += 1;
            } else {
                count.other += 1;
            }
        }
        debug!(port, capture_port, ?count, "flood complete");
        Ok(count)
    }

    // ── Backlog handling ─────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u32, Vec<CapturedFrame>>> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn collect(&self, port: u32) -> Result<(), VerifyError> {
        let frames = self.dataplane.poll(port).await?;
        if !frames.is_empty() {
            trace!(port, count = frames.len(), "captured");
            self.lock().entry(port).or_default().extend(frames);
        }
        Ok(())
    }

    /// Keep polling `ports` until the negative window has elapsed.
    async fn watch<'a>(
        &self,
        ports: impl Iterator<Item = &'a u32> + Clone,
    ) -> Result<(), VerifyError> {
        let deadline = Instant::now() + self.timing.negative_window();
        loop {
            for port in ports.clone() {
                self.collect(*port).await?;
            }
            if Instant::now() >= deadline {
                return Ok(());
            }
            sleep(self.timing.poll_interval).await;
        }
    }

    fn take_match(&self, port: u32, expected: &[u8], mask: &IgnoreMask) -> Option<CapturedFrame> {
        let mut backlog = self.lock();
        let frames = backlog.get_mut(&port)?;
        let idx = frames
            .iter()
            .position(|f| frames_match(expected, &f.data, mask))?;
        Some(frames.remove(idx))
    }

    fn count_matches(&self, port: u32, expected: &[u8], mask: &IgnoreMask) -> usize {
        self.lock().get(&port).map_or(0, |frames| {
            frames
                .iter()
                .filter(|f| frames_match(expected, &f.data, mask))
                .count()
        })
    }

    fn backlog_for(&self, port: u32) -> Vec<CapturedFrame> {
        self.lock().get(&port).cloned().unwrap_or_default()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn unexpected(port: u32, frame: CapturedFrame) -> VerifyError {
    let report = format!("{} bytes:\n{}", frame.data.len(), hex_dump(&frame.data));
    VerifyError::Unexpected {
        port,
        frame,
        report,
    }
}

fn missing_report(expected: &[u8], observed: &[CapturedFrame], mask: &IgnoreMask) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "expected ({} bytes):", expected.len());
    out.push_str(&hex_dump(expected));

    if observed.is_empty() {
        out.push_str("no frames observed\n");
        return out;
    }

    let _ = writeln!(out, "observed {} frame(s):", observed.len());
    for (i, frame) in observed.iter().enumerate() {
        let _ = writeln!(out, "#{} ({} bytes):", i + 1, frame.data.len());
        out.push_str(&hex_dump(&frame.data));
    }

    let closest = observed
        .iter()
        .enumerate()
        .map(|(i, f)| (i, diff(expected, &f.data, mask)))
        .min_by_key(|(_, d)| d.len());
    if let Some((i, diffs)) = closest {
        let _ = writeln!(out, "closest is #{}, differing in:", i + 1);
        for d in diffs {
            let _ = writeln!(out, "  {}: expected {}, got {}", d.field, d.expected, d.actual);
        }
    }
    out
}
