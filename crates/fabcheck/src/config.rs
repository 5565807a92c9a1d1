//! CLI configuration: a thin layer over `fabcheck_config` that applies
//! `GlobalOpts` flag overrides (--controller, --username, --timeout, ...).

use std::path::PathBuf;

use fabcheck_config::{Config, config_path, load_config};
use fabcheck_core::{FabricConfig, Topology};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform default.
pub fn resolved_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and fold the global flags into it.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = resolved_path(global);
    debug!(path = %path.display(), "loading config");
    let mut cfg = load_config(Some(&path))?;
    apply_overrides(&mut cfg, global)?;
    Ok(cfg)
}

/// Flags beat the file and `FABCHECK_<SECTION>__<KEY>` variables.
fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = &mut cfg.controller;
    if let Some(url) = &global.controller {
        controller.url.clone_from(url);
    }
    if let Some(user) = &global.username {
        controller.username = Some(user.clone());
    }
    if global.insecure {
        controller.insecure = true;
    }
    if let Some(timeout) = &global.timeout {
        humantime::parse_duration(timeout).map_err(|e| CliError::Validation {
            field: "timeout".into(),
            reason: e.to_string(),
        })?;
        controller.timeout.clone_from(timeout);
    }
    Ok(())
}

pub fn fabric_config(cfg: &Config) -> Result<FabricConfig, CliError> {
    Ok(cfg.fabric_config()?)
}

/// The selected testbed. Without any profiles on file and no `--profile`,
/// an empty topology is returned so controller-only checks still run.
pub fn topology(cfg: &Config, global: &GlobalOpts) -> Result<(String, Topology), CliError> {
    if cfg.profiles.is_empty() && global.profile.is_none() {
        debug!("no profiles configured, using an empty topology");
        return Ok(("(none)".into(), Topology::default()));
    }
    Ok(cfg.topology(global.profile.as_deref())?)
}
