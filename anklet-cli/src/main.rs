//! Anklet CLI
//!
//! Command-line interface for scheduling a pending workload on an Ankaios
//! agent and inspecting its execution state.

mod commands;
mod config;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "anklet")]
#[command(about = "Ankaios workload trigger CLI", long_about = None)]
struct Cli {
    /// Path or name of the ank binary
    #[arg(long, env = "ANKLET_ANK_PATH", default_value = "ank")]
    ank_path: String,

    /// Orchestrator URL passed to ank
    #[arg(long, env = "ANKLET_SERVER_URL")]
    server_url: Option<String>,

    /// Skip TLS verification towards the orchestrator
    #[arg(long, env = "ANKLET_INSECURE")]
    insecure: bool,

    /// Bound for each ank invocation, in seconds
    #[arg(long, env = "ANKLET_COMMAND_TIMEOUT", default_value_t = 10)]
    command_timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anklet=warn,anklet_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config {
        ank_path: cli.ank_path,
        server_url: cli.server_url,
        insecure: cli.insecure,
        command_timeout: Duration::from_secs(cli.command_timeout),
    };

    handle_command(cli.command, &config).await
}
