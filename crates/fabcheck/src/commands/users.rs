//! User account command handlers.

use tabled::Tabled;

use fabcheck_api::models::UserRecord;
use fabcheck_core::Fabric;

use crate::cli::{GlobalOpts, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::util::join_or_dash;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "User")]
    name: String,
    #[tabled(rename = "Groups")]
    groups: String,
}

impl From<&UserRecord> for UserRow {
    fn from(u: &UserRecord) -> Self {
        Self {
            name: u.user_name.clone(),
            groups: join_or_dash(&u.groups),
        }
    }
}

pub async fn handle(fabric: &Fabric, args: UsersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List { group } => {
            let mut users = fabric.users().await?;
            if let Some(group) = group {
                // The group endpoint is authoritative for membership.
                let members = fabric.users_in_group(&group).await?.users;
                users.retain(|u| members.contains(&u.user_name));
            }
            let out = output::render_list(
                global.output,
                &users,
                |r| UserRow::from(r),
                |u| u.user_name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
