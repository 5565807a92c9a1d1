//! PPPoE intermediate agent command handlers.

use tabled::Tabled;

use fabcheck_api::models::{PppoeiaOverview, PppoeiaPortRecord};
use fabcheck_core::Fabric;

use crate::cli::{GlobalOpts, PppoeiaArgs, PppoeiaCommand};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Delegate")]
    delegate: bool,
    #[tabled(rename = "Enabled")]
    enabled: bool,
}

#[derive(Tabled)]
struct PortRow {
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Host Port")]
    host_port: bool,
    #[tabled(rename = "Strip Vendor")]
    strip_vendor: bool,
    #[tabled(rename = "Circuit ID")]
    circuit_id: String,
    #[tabled(rename = "Remote ID")]
    remote_id: String,
}

impl From<&PppoeiaPortRecord> for PortRow {
    fn from(p: &PppoeiaPortRecord) -> Self {
        Self {
            port: p.port.map(|n| n.to_string()).unwrap_or_default(),
            host_port: p.host_port,
            strip_vendor: p.strip_vendor,
            circuit_id: p.circuit_id.clone(),
            remote_id: p.remote_id.clone(),
        }
    }
}

/// Delegates first, then any device that only reports a status.
fn device_rows(overview: &PppoeiaOverview) -> Vec<DeviceRow> {
    let enabled = |id: &str| {
        overview
            .devices
            .iter()
            .any(|d| d.device_id == id && d.status)
    };
    let mut rows: Vec<DeviceRow> = overview
        .delegate_devices
        .iter()
        .map(|id| DeviceRow {
            device: id.clone(),
            delegate: true,
            enabled: enabled(id),
        })
        .collect();
    rows.extend(
        overview
            .devices
            .iter()
            .filter(|d| !overview.delegate_devices.contains(&d.device_id))
            .map(|d| DeviceRow {
                device: d.device_id.clone(),
                delegate: false,
                enabled: d.status,
            }),
    );
    rows
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fabric: &Fabric,
    args: PppoeiaArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PppoeiaCommand::Show { device: None } => {
            let overview = fabric.pppoeia_devices().await?;
            let out = output::render_single(
                global.output,
                &overview,
                |o| output::render_table(&device_rows(o)),
                |o| o.delegate_devices.join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PppoeiaCommand::Show {
            device: Some(device),
        } => {
            let ports = fabric.pppoeia_ports_by_device(&device).await?;
            let out = output::render_list(
                global.output,
                &ports,
                |r| PortRow::from(r),
                |p| p.port.map(|n| n.to_string()).unwrap_or_default(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabcheck_api::models::PppoeiaDeviceStatus;

    #[test]
    fn status_only_devices_follow_delegates() {
        let overview = PppoeiaOverview {
            delegate_devices: vec!["of:01".into()],
            devices: vec![
                PppoeiaDeviceStatus {
                    device_id: "of:02".into(),
                    status: false,
                },
                PppoeiaDeviceStatus {
                    device_id: "of:01".into(),
                    status: true,
                },
            ],
        };
        let rows = device_rows(&overview);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].device, "of:01");
        assert!(rows[0].delegate && rows[0].enabled);
        assert_eq!(rows[1].device, "of:02");
        assert!(!rows[1].delegate);
    }
}
