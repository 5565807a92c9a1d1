//! Command dispatch: bridges CLI args -> fabric calls -> output formatting.

pub mod check;
pub mod config_cmd;
pub mod packet;
pub mod pppoeia;
pub mod routers;
pub mod segments;
pub mod sflow;
pub mod tenants;
pub mod topology;
pub mod users;
pub mod util;

use fabcheck_config::Config;
use fabcheck_core::Fabric;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    fabric: &Fabric,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Tenants(args) => tenants::handle(fabric, args, global).await,
        Command::Segments(args) => segments::handle(fabric, args, global).await,
        Command::Routers(args) => routers::handle(fabric, args, global).await,
        Command::Sflow(args) => sflow::handle(fabric, args, global).await,
        Command::Pppoeia(args) => pppoeia::handle(fabric, args, global).await,
        Command::Users(args) => users::handle(fabric, args, global).await,
        Command::Check(args) => check::handle(fabric, cfg, args, global).await,
        // Local commands are handled before a connection is made
        Command::Config(_)
        | Command::Packet(_)
        | Command::Topology(_)
        | Command::Completions(_) => {
            unreachable!("handled in main")
        }
    }
}
