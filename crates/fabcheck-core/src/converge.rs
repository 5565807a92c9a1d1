// ── Convergence helpers ──
//
// The controller applies configuration asynchronously: a 200 on a push
// means "accepted", not "programmed into every switch". Test cases wait a
// settle interval or poll for a condition before injecting traffic, and
// prime ARP state so routed frames have somewhere to go.

use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::model::{Device, Host, MacAddress};
use crate::packet::layers::Arp;
use crate::packet::simple::{PacketSpec, simple_arp_packet, simple_icmp_packet};
use crate::packet::parse_packet;
use crate::timing::Timing;
use crate::topology::Topology;
use crate::verify::Verifier;

// ── Fixed waits ──────────────────────────────────────────────────────

pub async fn wait_for_seconds(seconds: f64) -> Result<(), CoreError> {
    let delay = Duration::try_from_secs_f64(seconds)
        .map_err(|e| CoreError::validation("wait seconds", e.to_string()))?;
    debug!(?delay, "waiting");
    sleep(delay).await;
    Ok(())
}

/// Wait the settle interval after a configuration push.
pub async fn wait_for_system_stable(timing: &Timing) {
    debug!(settle = ?timing.settle, "waiting for fabric to settle");
    sleep(timing.settle).await;
}

pub async fn wait_after_reboot(timing: &Timing) {
    info!(wait = ?timing.post_reboot, "waiting for switches to come back");
    sleep(timing.post_reboot).await;
}

// ── Polling ──────────────────────────────────────────────────────────

/// Call `check` every `interval` until it yields `Some`, `timeout` passes,
/// or `cancel` fires. Errors from `check` abort the loop immediately.
pub async fn poll_until<T, F, Fut>(
    interval: Duration,
    timeout: Duration,
    cancel: &CancellationToken,
    what: &str,
    mut check: F,
) -> Result<T, CoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, CoreError>>,
{
    let started = Instant::now();
    let deadline = started + timeout;

    loop {
        if let Some(value) = check().await? {
            debug!(what, elapsed = ?started.elapsed(), "condition met");
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(CoreError::ConvergenceTimeout {
                what: what.to_owned(),
                waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::Cancelled),
            () = sleep(interval) => {}
        }
    }
}

// ── Reachability priming ─────────────────────────────────────────────

fn host_ip(host: &Host) -> Result<Ipv4Addr, CoreError> {
    host.ip
        .ok_or_else(|| CoreError::validation("host.ip", format!("{} has no address", host.id)))
}

/// Find the spine currently answering for `gateway`.
///
/// Sends an ARP request for the gateway from `host` on `probe_port` and
/// returns the spine whose MAC is on the first reply. Replies from anything
/// other than a spine are ignored.
pub async fn get_master_spine(
    verifier: &Verifier,
    topology: &Topology,
    host: &Host,
    gateway: Ipv4Addr,
    probe_port: u32,
    vlan: Option<u16>,
) -> Result<Device, CoreError> {
    let src_ip = host_ip(host)?;
    let mut spec = PacketSpec::new()
        .eth_src(host.mac)
        .eth_dst(MacAddress::BROADCAST)
        .arp_op(Arp::REQUEST)
        .ip_src(src_ip)
        .ip_dst(gateway);
    if let Some(vid) = vlan {
        spec = spec.vlan(vid);
    }
    let request = simple_arp_packet(&spec)?;
    verifier.send(probe_port, &request).await?;

    let spine_macs: Vec<MacAddress> = topology.spines.iter().map(|d| d.mac).collect();
    let reply = verifier
        .receive_matching(probe_port, |frame| {
            parse_packet(frame)
                .ok()
                .and_then(|p| p.arp().copied())
                .is_some_and(|arp| {
                    arp.op == Arp::REPLY && arp.spa == gateway && spine_macs.contains(&arp.sha)
                })
        })
        .await?;

    let responder = reply
        .and_then(|frame| parse_packet(&frame.data).ok())
        .and_then(|p| p.arp().map(|arp| arp.sha))
        .ok_or_else(|| CoreError::NoMasterSpine {
            gateway: gateway.to_string(),
        })?;

    let spine = topology
        .spines
        .iter()
        .find(|d| d.mac == responder)
        .cloned()
        .ok_or_else(|| CoreError::NoMasterSpine {
            gateway: gateway.to_string(),
        })?;
    info!(spine = %spine.id, mac = %spine.mac, %gateway, "master spine");
    Ok(spine)
}

/// Send one ICMP echo request from `host` to `gateway` through `spine` so
/// the fabric learns the host before routed traffic is injected.
pub async fn send_icmp_echo_request(
    verifier: &Verifier,
    host: &Host,
    spine: &Device,
    gateway: Ipv4Addr,
    port: u32,
) -> Result<(), CoreError> {
    let spec = PacketSpec::new()
        .eth_src(host.mac)
        .eth_dst(spine.mac)
        .ip_src(host_ip(host)?)
        .ip_dst(gateway);
    let frame = simple_icmp_packet(&spec)?;
    debug!(host = %host.id, spine = %spine.id, %gateway, port, "icmp prime");
    verifier.send(port, &frame).await?;
    Ok(())
}

/// Announce `host` with a broadcast ARP reply addressed to `gateway`.
pub async fn configure_arp(
    verifier: &Verifier,
    host: &Host,
    gateway: Ipv4Addr,
    port: u32,
) -> Result<(), CoreError> {
    let spec = PacketSpec::new()
        .eth_src(host.mac)
        .eth_dst(MacAddress::BROADCAST)
        .arp_op(Arp::REPLY)
        .arp_hw_target(MacAddress::BROADCAST)
        .ip_src(host_ip(host)?)
        .ip_dst(gateway);
    let frame = simple_arp_packet(&spec)?;
    debug!(host = %host.id, %gateway, port, "gratuitous arp");
    verifier.send(port, &frame).await?;
    Ok(())
}
