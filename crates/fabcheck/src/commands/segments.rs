//! Segment command handlers.

use tabled::Tabled;

use fabcheck_api::models::SegmentRecord;
use fabcheck_core::Fabric;

use crate::cli::{GlobalOpts, SegmentsArgs, SegmentsCommand};
use crate::error::CliError;
use crate::output;

use super::util::join_or_dash;

#[derive(Tabled)]
struct SegmentRow {
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Segment")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "VLAN")]
    value: String,
    #[tabled(rename = "Gateway IPs")]
    ips: String,
}

impl From<&SegmentRecord> for SegmentRow {
    fn from(s: &SegmentRecord) -> Self {
        Self {
            tenant: s.tenant_name.clone().unwrap_or_default(),
            name: s.segment_name.clone(),
            kind: s.segment_type.map(|t| t.to_string()).unwrap_or_default(),
            value: s.value.map(|v| v.to_string()).unwrap_or_default(),
            ips: join_or_dash(&s.ip_address),
        }
    }
}

pub async fn handle(
    fabric: &Fabric,
    args: SegmentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SegmentsCommand::List { tenant } => {
            let mut segments = fabric.segments().await?;
            if let Some(tenant) = tenant {
                segments.retain(|s| s.tenant_name.as_deref() == Some(tenant.as_str()));
            }
            let out = output::render_list(
                global.output,
                &segments,
                |r| SegmentRow::from(r),
                |s| s.segment_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
