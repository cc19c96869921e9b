//! `vguard check-config`

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::{error, info};
use vguard_core::{ConfigError, GuardConfig};

/// Validate a guard configuration file
#[derive(Args, Debug)]
pub struct CheckConfigCommand {
    /// Guard configuration file (TOML)
    pub config: PathBuf,
}

/// Load and validate the configuration. Returns every problem found.
pub fn handle_check_config_command(cmd: &CheckConfigCommand) -> Result<Vec<ConfigError>> {
    let config = GuardConfig::load_from_file(&cmd.config)?;
    let problems = config.validate();

    if problems.is_empty() {
        info!(config = %cmd.config.display(), "Configuration is valid");
        println!("{}: ok", cmd.config.display());
    } else {
        for problem in &problems {
            error!(error = %problem, "Invalid guard configuration");
            println!("{}: {problem}", cmd.config.display());
        }
    }
    Ok(problems)
}
