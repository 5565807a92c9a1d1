//! `packet build`: assemble a test frame from a template and print it.

use serde::Serialize;

use fabcheck_core::packet::hex_dump;
use fabcheck_core::{MacAddress, Packet, PacketSpec};

use crate::cli::{GlobalOpts, PacketArgs, PacketBuildArgs, PacketCommand, PacketKind};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct BuiltPacket {
    length: usize,
    layers: Vec<&'static str>,
    hex: String,
}

fn parse_mac(field: &str, value: &str) -> Result<MacAddress, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("'{value}' is not a MAC address"),
    })
}

/// Template defaults overlaid with whatever flags were given.
fn spec_from_args(args: &PacketBuildArgs) -> Result<PacketSpec, CliError> {
    let mut spec = PacketSpec::new();
    if let Some(mac) = &args.src_mac {
        spec = spec.eth_src(parse_mac("src-mac", mac)?);
    }
    if let Some(mac) = &args.dst_mac {
        spec = spec.eth_dst(parse_mac("dst-mac", mac)?);
    }
    if let Some(vid) = args.vlan {
        spec = spec.vlan(vid);
    }
    if let Some(pcp) = args.pcp {
        spec = spec.pcp(pcp);
    }
    if let Some(ip) = args.src {
        spec = spec.ip_src(ip);
    }
    if let Some(ip) = args.dst {
        spec = spec.ip_dst(ip);
    }
    if let Some(port) = args.sport {
        spec = spec.sport(port);
    }
    if let Some(port) = args.dport {
        spec = spec.dport(port);
    }
    if let Some(ttl) = args.ttl {
        spec = spec.ip_ttl(ttl);
    }
    if let Some(len) = args.len {
        spec = spec.pktlen(len);
    }
    Ok(spec)
}

fn build(args: &PacketBuildArgs) -> Result<Packet, CliError> {
    let spec = spec_from_args(args)?;
    let frame = match args.kind {
        PacketKind::Tcp => spec.build_tcp()?,
        PacketKind::Udp => spec.build_udp()?,
        PacketKind::Icmp => spec.build_icmp()?,
        PacketKind::Eth => spec.build_eth()?,
        PacketKind::Arp => spec.build_arp()?,
        PacketKind::PppoeDiscovery => spec.build_pppoe_discovery()?,
    };
    Ok(Packet::from(frame))
}

pub fn handle(args: PacketArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PacketCommand::Build(build_args) => {
            let packet = build(&build_args)?;
            let built = BuiltPacket {
                length: packet.len(),
                layers: packet.parse()?.layer_names(),
                hex: packet.to_hex(),
            };
            let dump = build_args.dump;
            let out = output::render_single(
                global.output,
                &built,
                |b| if dump { hex_dump(packet.as_bytes()) } else { b.hex.clone() },
                |b| b.hex.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
