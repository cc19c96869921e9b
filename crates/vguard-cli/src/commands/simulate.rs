//! `vguard simulate`

use crate::scenario::{Scenario, ScenarioReport};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Run a scenario file through a simulated session
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// Scenario file (TOML)
    pub scenario: PathBuf,

    /// Override the scenario's delivery seed
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Handle simulate command execution
pub async fn handle_simulate_command(cmd: SimulateCommand) -> Result<ScenarioReport> {
    let mut scenario = Scenario::load(&cmd.scenario)?;
    if cmd.seed.is_some() {
        scenario.seed = cmd.seed;
    }

    info!(
        scenario = %cmd.scenario.display(),
        peers = scenario.peers.len(),
        seed = ?scenario.seed,
        "Running scenario"
    );
    let report = scenario.run().await?;
    print!("{report}");
    Ok(report)
}
