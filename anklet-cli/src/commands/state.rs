//! State command handler

use anklet_client::{Connector, ControlSession};
use anklet_core::domain::instance::WorkloadInstanceName;
use anklet_core::domain::state::ExecutionState;
use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

/// Handle `anklet state <instance>`
pub async fn handle_state_command(instance: &str, config: &Config) -> Result<()> {
    let instance: WorkloadInstanceName = instance
        .parse()
        .with_context(|| format!("Invalid instance name '{}'", instance))?;

    let connector = config.connector();
    let lookup = instance.clone();
    let state = tokio::task::spawn_blocking(move || {
        let session = connector.connect()?;
        session.get_execution_state(&lookup)
    })
    .await
    .context("State query task failed")??;

    match state {
        Some(state) => {
            println!("{}", format!("Instance {}", instance).bold());
            println!("  State:    {}", colorize_state(&state));
            println!("  Substate: {}", state.sub_state);
            if !state.additional_info.is_empty() {
                println!("  Info:     {}", state.additional_info);
            }
        }
        None => println!(
            "{}",
            format!("No execution state reported for {}", instance).yellow()
        ),
    }

    Ok(())
}

fn colorize_state(state: &ExecutionState) -> ColoredString {
    let text = state.state.to_string();
    if state.is_running() {
        text.green()
    } else if state.is_failure() {
        text.red()
    } else {
        text.yellow()
    }
}
