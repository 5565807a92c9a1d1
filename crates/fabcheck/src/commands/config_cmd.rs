//! Config subcommand handlers.

use tabled::Tabled;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Profile")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Spines")]
    spines: usize,
    #[tabled(rename = "Leaves")]
    leaves: usize,
    #[tabled(rename = "Hosts")]
    hosts: usize,
    #[tabled(rename = "Default")]
    default: String,
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = config::resolved_path(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let toml = cfg.to_toml_redacted()?;
            let out = output::render_single(
                global.output,
                &cfg.redacted(),
                |_| toml.clone(),
                |c| c.controller.url.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let default = cfg.default_profile.clone().unwrap_or_default();
            let names: Vec<String> = cfg.profiles.keys().cloned().collect();
            let out = output::render_list(
                global.output,
                &names,
                |name| {
                    let p = &cfg.profiles[name];
                    ProfileRow {
                        name: name.clone(),
                        kind: p.kind.to_string(),
                        spines: p.spines.len(),
                        leaves: p.leaves.len(),
                        hosts: p.hosts.len(),
                        default: if *name == default { "*".into() } else { String::new() },
                    }
                },
                Clone::clone,
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
