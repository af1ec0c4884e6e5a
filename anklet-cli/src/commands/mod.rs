//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod apply;
mod state;

pub use apply::ApplyArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Schedule the pending workload on an agent and wait until it runs
    Apply(ApplyArgs),
    /// Show the execution state of a workload instance
    State {
        /// Instance name (<workload>.<id>.<agent>)
        instance: String,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Apply(args) => apply::handle_apply_command(args, config).await,
        Commands::State { instance } => state::handle_state_command(&instance, config).await,
    }
}

/// Resolves on Ctrl-C or SIGTERM
pub(crate) async fn termination_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
