//! Logical router command handlers.

use tabled::Tabled;

use fabcheck_api::models::RouterRecord;
use fabcheck_core::Fabric;

use crate::cli::{GlobalOpts, RoutersArgs, RoutersCommand};
use crate::error::CliError;
use crate::output;

use super::util::join_or_dash;

#[derive(Tabled)]
struct RouterRow {
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Router")]
    name: String,
    #[tabled(rename = "Interfaces")]
    interfaces: String,
    #[tabled(rename = "Tenant Routers")]
    tenant_routers: String,
}

impl From<&RouterRecord> for RouterRow {
    fn from(r: &RouterRecord) -> Self {
        Self {
            tenant: r.tenant.clone().unwrap_or_default(),
            name: r.name.clone(),
            interfaces: join_or_dash(&r.interfaces),
            tenant_routers: join_or_dash(&r.tenant_routers),
        }
    }
}

pub async fn handle(
    fabric: &Fabric,
    args: RoutersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RoutersCommand::List { tenant } => {
            let routers = match tenant {
                Some(t) => fabric.tenant_routers(&t).await?,
                None => fabric.routers().await?,
            };
            let out = output::render_list(
                global.output,
                &routers,
                |r| RouterRow::from(r),
                |r| r.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
