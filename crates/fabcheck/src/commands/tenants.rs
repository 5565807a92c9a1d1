//! Tenant command handlers.

use tabled::Tabled;
use tracing::info;

use fabcheck_api::models::TenantRecord;
use fabcheck_core::Fabric;
use fabcheck_core::builder::Tenant;

use crate::cli::{GlobalOpts, TenantsArgs, TenantsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
}

impl From<&TenantRecord> for TenantRow {
    fn from(t: &TenantRecord) -> Self {
        Self {
            name: t.name.clone(),
            kind: t.kind.map(|k| k.to_string()).unwrap_or_default(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    fabric: &Fabric,
    args: TenantsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TenantsCommand::List => {
            let tenants = fabric.tenants().await?;
            let out = output::render_list(
                global.output,
                &tenants,
                |r| TenantRow::from(r),
                |t| t.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TenantsCommand::Create { name, system } => {
            if fabric.tenant_exists(&name).await? {
                return Err(CliError::AlreadyExists {
                    resource_type: "tenant".into(),
                    identifier: name,
                });
            }
            let tenant = if system { Tenant::system(&name) } else { Tenant::new(&name) };
            let handle = tenant.build(fabric).await?;
            info!(tenant = handle.name(), kind = %handle.kind(), "tenant created");
            output::print_output(&format!("created tenant {}", handle.name()), global.quiet);
            Ok(())
        }

        TenantsCommand::Delete { name } => {
            if !fabric.tenant_exists(&name).await? {
                return Err(CliError::NotFound {
                    resource_type: "tenant".into(),
                    identifier: name,
                    list_command: "tenants list".into(),
                });
            }
            if !util::confirm(&format!("delete tenant {name}"), global.yes)? {
                return Ok(());
            }
            fabric.client().delete_tenant(&name).await?;
            info!(tenant = %name, "tenant deleted");
            output::print_output(&format!("deleted tenant {name}"), global.quiet);
            Ok(())
        }
    }
}
