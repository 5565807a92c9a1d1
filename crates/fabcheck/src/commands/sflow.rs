//! sFlow command handlers.

use tabled::Tabled;

use fabcheck_api::models::SflowRecord;
use fabcheck_core::Fabric;

use crate::cli::{GlobalOpts, SflowArgs, SflowCommand};
use crate::error::CliError;
use crate::output;

use super::util::join_or_dash;

#[derive(Tabled)]
struct SflowRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Collector")]
    collector: String,
    #[tabled(rename = "Header")]
    max_header: u32,
    #[tabled(rename = "Payload")]
    max_payload: u32,
    #[tabled(rename = "Poll (s)")]
    polling: u32,
    #[tabled(rename = "Rate")]
    rate: u32,
    #[tabled(rename = "Ports")]
    ports: String,
}

impl From<&SflowRecord> for SflowRow {
    fn from(s: &SflowRecord) -> Self {
        Self {
            device: s.device_id.clone().unwrap_or_default(),
            collector: s.controller_ip.clone(),
            max_header: s.max_header_length,
            max_payload: s.max_payload_length,
            polling: s.polling_interval,
            rate: s.sampling_rate,
            ports: join_or_dash(&s.port),
        }
    }
}

fn device_label(s: &SflowRecord) -> String {
    s.device_id.clone().unwrap_or_else(|| s.controller_ip.clone())
}

pub async fn handle(fabric: &Fabric, args: SflowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        SflowCommand::Show { device: None } => {
            let all = fabric.sflow_all().await?;
            let out = output::render_list(global.output, &all, |r| SflowRow::from(r), device_label)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SflowCommand::Show {
            device: Some(device),
        } => {
            let Some(mut record) = fabric.sflow_by_device(&device).await? else {
                return Err(CliError::NotFound {
                    resource_type: "sFlow configuration".into(),
                    identifier: device,
                    list_command: "sflow show".into(),
                });
            };
            record.device_id.get_or_insert(device);
            let out = output::render_list(
                global.output,
                std::slice::from_ref(&record),
                |r| SflowRow::from(r),
                device_label,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
