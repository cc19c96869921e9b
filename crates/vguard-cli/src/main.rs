//! VersionGuard CLI
//!
//! Scenario runner and configuration tooling for the version guard.

use anyhow::Result;
use clap::{Parser, Subcommand};
use vguard_cli::commands::{
    check_config::{handle_check_config_command, CheckConfigCommand},
    inspect::{handle_inspect_command, InspectCommand},
    simulate::{handle_simulate_command, SimulateCommand},
};

#[derive(Parser)]
#[command(name = "vguard")]
#[command(about = "VersionGuard - session version mismatch detection tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario through a simulated session
    Simulate(SimulateCommand),

    /// Validate a guard configuration file
    CheckConfig(CheckConfigCommand),

    /// Print the instant a metadata body carries
    Inspect(InspectCommand),
}

fn log_level(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_level(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Simulate(cmd) => {
            handle_simulate_command(cmd).await?;
        }

        Commands::CheckConfig(cmd) => {
            if !handle_check_config_command(&cmd)?.is_empty() {
                std::process::exit(1);
            }
        }

        Commands::Inspect(cmd) => {
            handle_inspect_command(&cmd)?;
        }
    }

    Ok(())
}
