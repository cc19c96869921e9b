//! `vguard inspect`

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use vguard_core::{payload, NetworkInstant, DEFAULT_TIMESTAMP_FIELD};

/// Extract the last-modified instant from a metadata body
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// File holding the fetched body
    pub body: PathBuf,

    /// Field carrying the timestamp
    #[arg(long, default_value = DEFAULT_TIMESTAMP_FIELD)]
    pub field: String,
}

/// Parse the body and print the instant
pub fn handle_inspect_command(cmd: &InspectCommand) -> Result<NetworkInstant> {
    let body = std::fs::read_to_string(&cmd.body)
        .with_context(|| format!("Failed to read {}", cmd.body.display()))?;
    let instant = payload::extract_remote_instant(&body, &cmd.field)
        .with_context(|| format!("Failed to interpret {}", cmd.body.display()))?;

    println!("{}: {instant}", cmd.field);
    Ok(instant)
}
