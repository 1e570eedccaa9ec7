//! Reference operator CLI for the LTA bundle lifecycle coordinator.
//!
//! Talks to `lta-rest` over the same `LtaClient` the worker stages use —
//! there is no separate CLI-specific protocol. Intentionally thin: the
//! coordinator has no automatic claim expiry (see `lta-worker`'s doc
//! comments), so the documented remedy for a stuck claim is an operator
//! running this tool, not a server-side timer.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod cmd;
mod config;

use cmd::request::RequestCommand;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "lta")]
#[command(about = "Operator CLI for the LTA bundle lifecycle coordinator")]
#[command(version)]
struct Cli {
    /// Print output as JSON instead of a plain table.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect or submit transfer requests.
    #[command(subcommand)]
    Request(RequestCommand),

    /// Component heartbeat overview, or one component's detail.
    Status { component: Option<String> },

    /// Print the configuration this CLI resolved from the environment.
    DisplayConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::DisplayConfig => {
            let config = CliConfig::load()?;
            println!("{}", serde_json::to_string_pretty(&config.as_display_map())?);
            Ok(())
        }
        Command::Request(sub) => {
            let config = CliConfig::load()?;
            cmd::request::run(&config.client(), sub, cli.json).await
        }
        Command::Status { component } => {
            let config = CliConfig::load()?;
            cmd::status::run(&config.client(), component, cli.json).await
        }
    }
}
