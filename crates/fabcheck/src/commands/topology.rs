//! `topology show`: the testbed described by the active profile.

use tabled::Tabled;

use fabcheck_config::Config;
use fabcheck_core::Topology;

use crate::cli::{GlobalOpts, TopologyArgs, TopologyCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Ports / NOS")]
    detail: String,
}

fn node_rows(topo: &Topology) -> Vec<NodeRow> {
    let switches = topo.devices().map(|d| NodeRow {
        role: d.role.to_string(),
        name: d.name.clone(),
        id: d.id.clone(),
        mac: d.mac.to_string(),
        ip: d.mgmt_ip.to_string(),
        detail: format!(
            "{} ({})",
            d.front_ports.map(|p| p.to_string()).join("/"),
            d.nos
        ),
    });

    let hosts = topo
        .hosts
        .iter()
        .map(|h| ("host", h))
        .chain(topo.external_routers.iter().map(|h| ("router", h)))
        .chain(topo.dhcp_server.iter().map(|h| ("dhcp", h)))
        .map(|(role, h)| NodeRow {
            role: role.into(),
            name: h.nic_name.clone().unwrap_or_default(),
            id: h.id.clone(),
            mac: h.mac.to_string(),
            ip: h.ip.map(|ip| ip.to_string()).unwrap_or_default(),
            detail: String::new(),
        });

    switches.chain(hosts).collect()
}

fn detail(name: &str, topo: &Topology) -> String {
    let ports = topo
        .port_map
        .iter()
        .map(|(port, iface)| format!("{port}={iface}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Profile: {name} ({})\nDataplane ports: {}\n{}",
        topo.kind,
        if ports.is_empty() { "-".into() } else { ports },
        output::render_table(&node_rows(topo))
    )
}

pub fn handle(args: TopologyArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        TopologyCommand::Show => {
            let (name, topo) = config::topology(cfg, global)?;
            let out = output::render_single(
                global.output,
                &topo,
                |t| detail(&name, t),
                |t| t.devices().map(|d| d.id.clone()).collect::<Vec<_>>().join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
