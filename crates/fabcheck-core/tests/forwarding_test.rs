#![allow(clippy::unwrap_used)]
// Forwarding behaviours checked end to end through the verifier, with a
// loopback dataplane standing in for the fabric.

use std::net::Ipv4Addr;
use std::sync::Arc;

use bytes::Bytes;
use pretty_assertions::assert_eq;

use fabcheck_core::packet::dhcp::DhcpExchange;
use fabcheck_core::packet::simple::{simple_eth_packet, simple_tcp_packet, simple_udp_packet};
use fabcheck_core::packet::{frames_match, parse_packet};
use fabcheck_core::{
    Forwarder, IgnoreMask, LoopbackDataplane, MacAddress, PacketSpec, Timing, Verifier, VerifyError,
};

// ── Helpers ─────────────────────────────────────────────────────────

const HOST_MAC: MacAddress = MacAddress::new([0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
const SPINE_MAC: MacAddress = MacAddress::new([0xcc, 0x37, 0xab, 0x00, 0x00, 0x01]);
const NEXTHOP_MAC: MacAddress = MacAddress::new([0x00, 0x00, 0x00, 0x00, 0x00, 0x02]);

fn verifier(forwarder: Forwarder) -> (Arc<LoopbackDataplane>, Verifier) {
    let dataplane = Arc::new(LoopbackDataplane::new([1, 2, 3, 4], forwarder));
    let verifier = Verifier::new(dataplane.clone(), Timing::fast());
    (dataplane, verifier)
}

fn routed_spec() -> PacketSpec {
    PacketSpec::new()
        .ip_src(Ipv4Addr::new(192, 168, 10, 10))
        .ip_dst(Ipv4Addr::new(192, 168, 20, 10))
}

/// Ingress as a host on VLAN 10 sends it toward its gateway.
fn routed_ingress() -> Bytes {
    simple_tcp_packet(
        &routed_spec()
            .eth_src(HOST_MAC)
            .eth_dst(SPINE_MAC)
            .vlan(10)
            .pktlen(68),
    )
    .unwrap()
}

/// What the next hop should see: untagged, TTL decremented, MACs rewritten.
fn routed_egress() -> Bytes {
    simple_tcp_packet(
        &routed_spec()
            .eth_src(SPINE_MAC)
            .eth_dst(NEXTHOP_MAC)
            .ip_ttl(63)
            .pktlen(64),
    )
    .unwrap()
}

// ── Routed unicast ──────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn routed_unicast_one_copy_with_ttl_and_mac_rewrite() {
    let forwarder: Forwarder = Arc::new(|port, frame| {
        if port != 1 || frame != routed_ingress().as_ref() {
            return Vec::new();
        }
        let ttl = parse_packet(frame).unwrap().ipv4().unwrap().ttl;
        let out = simple_tcp_packet(
            &routed_spec()
                .eth_src(SPINE_MAC)
                .eth_dst(NEXTHOP_MAC)
                .ip_ttl(ttl - 1)
                .pktlen(64),
        )
        .unwrap();
        vec![(2, out)]
    });
    let (_, verifier) = verifier(forwarder);

    let ingress = routed_ingress();
    assert_eq!(ingress.len(), 68);
    verifier.send(1, &ingress).await.unwrap();

    let expected = routed_egress();
    verifier
        .verify_packets(&expected, &[2], &[1, 3, 4], &IgnoreMask::new())
        .await
        .unwrap();

    let parsed = parse_packet(&expected).unwrap();
    assert_eq!(&parsed.layer_names()[..3], &["ethernet", "ipv4", "tcp"]);
    assert_eq!(parsed.ipv4().unwrap().ttl, 63);
    verifier.verify_no_other_packets().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn duplicate_routed_copy_is_reported() {
    let forwarder: Forwarder = Arc::new(|_, _| vec![(2, routed_egress()), (2, routed_egress())]);
    let (_, verifier) = verifier(forwarder);

    verifier.send(1, &routed_ingress()).await.unwrap();
    let err = verifier
        .verify_packets(&routed_egress(), &[2], &[3], &IgnoreMask::new())
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Multiple { port: 2, count: 2 }));
}

#[tokio::test(start_paused = true)]
async fn missing_routed_copy_carries_observed_frames() {
    // Forgets to decrement TTL.
    let forwarder: Forwarder = Arc::new(|_, _| {
        let wrong = simple_tcp_packet(
            &routed_spec()
                .eth_src(SPINE_MAC)
                .eth_dst(NEXTHOP_MAC)
                .pktlen(64),
        )
        .unwrap();
        vec![(2, wrong)]
    });
    let (_, verifier) = verifier(forwarder);

    verifier.send(1, &routed_ingress()).await.unwrap();
    match verifier.verify_packet(&routed_egress(), 2).await {
        Err(VerifyError::Missing {
            port,
            observed,
            report,
            ..
        }) => {
            assert_eq!(port, 2);
            assert_eq!(observed.len(), 1);
            assert!(report.contains("ipv4.ttl"), "report was:\n{report}");
        }
        other => panic!("expected Missing, got {other:?}"),
    }
}

// ── Fan-out ─────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn span_mirror_fans_out_to_target() {
    // Port 1 forwards to 2; the session mirrors port 1 ingress onto 4.
    let forwarder: Forwarder = Arc::new(|port, frame| {
        if port != 1 {
            return Vec::new();
        }
        let copy = Bytes::copy_from_slice(frame);
        vec![(2, copy.clone()), (4, copy)]
    });
    let (_, verifier) = verifier(forwarder);

    let frame = simple_udp_packet(&PacketSpec::new()).unwrap();
    verifier.send(1, &frame).await.unwrap();
    verifier
        .verify_packets(&frame, &[2, 4], &[3], &IgnoreMask::new())
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn unknown_unicast_floods_members_except_ingress() {
    // VLAN 10 bridge: port 1 and 3 untagged, port 2 tagged, port 4 not a member.
    let untagged =
        simple_eth_packet(&PacketSpec::new().eth_dst(MacAddress::new([0, 0, 0, 0, 0, 0x99])))
            .unwrap();
    let tagged = simple_eth_packet(
        &PacketSpec::new()
            .eth_dst(MacAddress::new([0, 0, 0, 0, 0, 0x99]))
            .vlan(10)
            .pktlen(64),
    )
    .unwrap();

    let (flood_untagged, flood_tagged) = (untagged.clone(), tagged.clone());
    let forwarder: Forwarder = Arc::new(move |ingress, _| {
        [(1, &flood_untagged), (2, &flood_tagged), (3, &flood_untagged)]
            .into_iter()
            .filter(|(port, _)| *port != ingress)
            .map(|(port, frame)| (port, frame.clone()))
            .collect()
    });
    let (dataplane, verifier) = verifier(forwarder);

    verifier.send(1, &untagged).await.unwrap();
    verifier
        .verify_each(&[(2, tagged.as_ref()), (3, untagged.as_ref())], &IgnoreMask::new())
        .await
        .unwrap();
    verifier.verify_no_packet(&untagged, 1, &IgnoreMask::new()).await.unwrap();
    verifier.verify_no_packet(&untagged, 4, &IgnoreMask::new()).await.unwrap();
    verifier.verify_no_other_packets().await.unwrap();

    assert_eq!(dataplane.injected().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn flood_onto_ingress_is_unexpected() {
    let frame = simple_eth_packet(&PacketSpec::new()).unwrap();
    let echo = frame.clone();
    let forwarder: Forwarder = Arc::new(move |ingress, _| vec![(ingress, echo.clone())]);
    let (_, verifier) = verifier(forwarder);

    verifier.send(3, &frame).await.unwrap();
    let err = verifier
        .verify_no_packet(&frame, 3, &IgnoreMask::new())
        .await
        .unwrap_err();
    assert!(matches!(err, VerifyError::Unexpected { port: 3, .. }));
}

// ── DHCP relay ──────────────────────────────────────────────────────

fn relay_exchange() -> DhcpExchange {
    DhcpExchange::new(
        MacAddress::new([0x00, 0x00, 0x00, 0x00, 0x00, 0x11]),
        SPINE_MAC,
        MacAddress::new([0x00, 0x00, 0x00, 0x00, 0x00, 0x33]),
        Ipv4Addr::new(192, 168, 200, 10),
    )
    .gateways(Ipv4Addr::new(192, 168, 50, 1), Ipv4Addr::new(192, 168, 200, 1))
    .allocated(Ipv4Addr::new(192, 168, 50, 51))
}

#[tokio::test(start_paused = true)]
async fn dhcp_relay_sets_giaddr_and_hops_both_ways() {
    // Client on port 1 (t1/s1, VLAN 10), server on port 3.
    let forwarder: Forwarder = Arc::new(|port, frame| {
        let exchange = relay_exchange();
        let bootp = parse_packet(frame).ok().and_then(|p| p.bootp().copied());
        match (port, bootp) {
            (1, Some(b)) if b.giaddr == Ipv4Addr::UNSPECIFIED => {
                vec![(3, exchange.relayed_discover().unwrap())]
            }
            (3, Some(_)) => vec![(1, exchange.relayed_offer().unwrap())],
            _ => Vec::new(),
        }
    });
    let (_, verifier) = verifier(forwarder);
    let exchange = relay_exchange();

    verifier.send(1, &exchange.discover().unwrap()).await.unwrap();
    let relayed = verifier
        .verify_packet(&exchange.relayed_discover().unwrap(), 3)
        .await
        .unwrap();
    let parsed = parse_packet(&relayed.data).unwrap();
    let bootp = parsed.bootp().unwrap();
    assert_eq!(bootp.giaddr, Ipv4Addr::new(192, 168, 50, 1));
    assert_eq!(bootp.hops, 1);
    assert_eq!(parsed.ipv4().unwrap().dst, Ipv4Addr::new(192, 168, 200, 10));

    verifier.send(3, &exchange.offer().unwrap()).await.unwrap();
    let back = verifier
        .verify_packet(&exchange.relayed_offer().unwrap(), 1)
        .await
        .unwrap();
    let offer = parse_packet(&back.data).unwrap();
    assert_eq!(offer.bootp().unwrap().yiaddr, Ipv4Addr::new(192, 168, 50, 51));
    assert_eq!(offer.ethernet().unwrap().dst, MacAddress::new([0, 0, 0, 0, 0, 0x11]));
}

// ── Masked matching ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn rewritten_ip_id_matches_only_under_mask() {
    // Bytes 18..20 are the IPv4 id of an untagged frame.
    let forwarder: Forwarder = Arc::new(|_, frame| {
        let mut out = frame.to_vec();
        out[18] ^= 0xff;
        out[19] ^= 0x0f;
        vec![(2, Bytes::from(out))]
    });
    let (_, verifier) = verifier(forwarder);
    let frame = simple_udp_packet(&PacketSpec::new()).unwrap();

    verifier.send(1, &frame).await.unwrap();
    let captured = verifier
        .verify_packet_masked(&frame, 2, &IgnoreMask::new().field("ipv4.id"))
        .await
        .unwrap();
    assert!(!frames_match(&frame, &captured.data, &IgnoreMask::new()));
    assert!(frames_match(&frame, &captured.data, &IgnoreMask::ipv4_id_and_checksum()));
}
