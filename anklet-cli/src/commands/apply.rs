//! Apply command handler
//!
//! Schedules the pending workload on an agent, then waits for it to reach
//! RUNNING, printing each step as it happens. A termination signal closes
//! the orchestrator session and ends the command successfully.

use std::time::Duration;

use anklet_client::workflow::{self, DEFAULT_AGENT, DEFAULT_WORKLOAD, TriggerRequest};
use anklet_client::{Connector, ControlSession};
use anklet_core::domain::state::{ExecutionState, WaitOutcome};
use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use tracing::debug;

use crate::commands::termination_signal;
use crate::config::Config;

/// Arguments of `anklet apply`
#[derive(Args)]
pub struct ApplyArgs {
    /// Name of the unscheduled workload
    #[arg(long, env = "ANKLET_WORKLOAD", default_value = DEFAULT_WORKLOAD)]
    workload: String,

    /// Agent to schedule the workload on
    #[arg(long, env = "ANKLET_AGENT", default_value = DEFAULT_AGENT)]
    agent: String,

    /// Seconds to wait for the RUNNING state
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

/// Handle `anklet apply`
pub async fn handle_apply_command(args: ApplyArgs, config: &Config) -> Result<()> {
    let request = TriggerRequest::new(args.workload, args.agent, Duration::from_secs(args.timeout));

    debug!(
        "Applying {} to {} (timeout {:?}) via {}",
        request.workload, request.agent, request.timeout, config.ank_path
    );

    let session = config.connector().connect()?;
    let handle = session.handle();

    let mut task = tokio::task::spawn_blocking(move || apply_and_wait(&session, &request));

    tokio::select! {
        joined = &mut task => {
            joined.context("Apply task failed")??;
            Ok(())
        }
        _ = termination_signal() => {
            println!("{}", "Termination signal received, closing the session...".yellow());
            handle.close();
            // the session is released once the blocking task returns
            let _ = task.await;
            Ok(())
        }
    }
}

/// Runs the whole apply-and-await sequence on one session
fn apply_and_wait<S: ControlSession + ?Sized>(
    session: &S,
    request: &TriggerRequest,
) -> Result<WaitOutcome> {
    let state = workflow::current_state(session, &request.workload)
        .context("Failed to get the current state")?;
    println!("{}", "Current state:".bold());
    println!("{}", serde_json::to_string_pretty(&state)?);

    let workload = workflow::assign(&state, &request.workload, &request.agent)?;
    let (instance, response) =
        workflow::submit(session, &workload).context("Failed to apply the workload")?;
    println!("{}", "Update response:".bold());
    println!("{}", serde_json::to_string_pretty(&response)?);
    println!("Scheduled {} on {}", instance.to_string().cyan(), request.agent.bold());

    if let Some(current) = session.get_execution_state(&instance)? {
        print_state(&current);
    }

    let outcome = workflow::await_running_with(session, &instance, request.timeout, print_state)
        .context("Failed while waiting for the workload")?;

    match outcome {
        WaitOutcome::Running => println!("{}", "Workload reached the RUNNING state.".green().bold()),
        WaitOutcome::Timeout => println!(
            "{}",
            "Workload didn't reach the required state in time.".yellow().bold()
        ),
    }

    Ok(outcome)
}

fn print_state(state: &ExecutionState) {
    let line = format!(
        "State: {}, substate: {}, info: {}",
        state.state, state.sub_state, state.additional_info
    );
    if state.is_failure() {
        println!("{}", line.red());
    } else {
        println!("{}", line);
    }
}
