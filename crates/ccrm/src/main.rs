//! C&C CRM CLI - roles, permissions and journey field workflows
//!
//! This CLI gives dispatchers and field crews a terminal interface to:
//! - Inspect the role hierarchy and what each role may do
//! - Evaluate permission gates
//! - Follow a journey through its four field steps
//! - Start, fill in, complete and approve steps

use clap::{Parser, Subcommand};
use journey_engine::{telemetry, EngineConfig};
use std::path::PathBuf;

mod commands;
mod error;
mod output;

use commands::{access, journey};
use error::CliResult;

/// C&C CRM CLI application
#[derive(Parser)]
#[command(name = "ccrm")]
#[command(about = "C&C CRM - roles and journey field workflow CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CCRM_CONFIG")]
    config: Option<PathBuf>,

    /// Journey API base URL (overrides the config file and CCRM_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Access(access::AccessCommands),

    /// Journey field workflow
    Journey {
        #[command(subcommand)]
        command: journey::JourneyCommands,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    telemetry::init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::Access(command) => access::execute(command, cli.output),
        Commands::Journey { command } => journey::execute(command, &config, cli.output).await,
        Commands::Config => {
            let mut shown = config.clone();
            if shown.api.bearer_token.is_some() {
                shown.api.bearer_token = Some("********".into());
            }
            output::print_single(&shown, cli.output)
        }
    }
}
