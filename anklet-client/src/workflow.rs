//! Apply-and-await workflow
//!
//! Moves one pending workload onto an agent and observes it until the
//! orchestrator reports it RUNNING:
//!
//! ```text
//! UNSCHEDULED --apply(agent)--> PENDING --(orchestrator)--> STARTING --> RUNNING
//!                                                            \--> StartingFailed / timeout
//! ```
//!
//! The workflow only observes the transitions after the apply; it never
//! retries, and a failed wait does not undo the apply.

use std::time::Duration;

use anklet_core::domain::complete_state::{CompleteState, UpdateStateResponse};
use anklet_core::domain::field_mask::FieldMask;
use anklet_core::domain::instance::WorkloadInstanceName;
use anklet_core::domain::state::{ExecutionState, ExecutionStateEnum, WaitOutcome};
use anklet_core::domain::workload::Workload;
use tracing::info;

use crate::error::{ClientError, Result};
use crate::session::ControlSession;

/// Workload that is kept unscheduled until it is triggered
pub const DEFAULT_WORKLOAD: &str = "symphony";

/// Agent the workload is assigned to
pub const DEFAULT_AGENT: &str = "agent_A";

/// Parameters of one trigger
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    pub workload: String,
    pub agent: String,
    pub timeout: Duration,
}

impl TriggerRequest {
    pub fn new(workload: impl Into<String>, agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            workload: workload.into(),
            agent: agent.into(),
            timeout,
        }
    }
}

/// Current desired state of one workload
pub fn current_state<S: ControlSession + ?Sized>(
    session: &S,
    workload_name: &str,
) -> Result<CompleteState> {
    session.get_state(&[FieldMask::desired_workload(workload_name)])
}

/// Takes `workload_name` out of `state` and assigns it to `agent`
///
/// Fails if the workload is already scheduled on some agent.
pub fn assign(state: &CompleteState, workload_name: &str, agent: &str) -> Result<Workload> {
    let mut workload = state.get_workload(workload_name).ok_or_else(|| {
        ClientError::NotFound(format!("No '{}' workload found in current state", workload_name))
    })?;

    if let Some(current) = workload.agent() {
        return Err(ClientError::InvalidRequest(format!(
            "workload '{}' is already scheduled on agent '{}'",
            workload_name, current
        )));
    }

    workload.update_agent_name(agent);
    Ok(workload)
}

/// Fetches the unscheduled workload and assigns it to `agent` locally
pub fn prepare<S: ControlSession + ?Sized>(
    session: &S,
    workload_name: &str,
    agent: &str,
) -> Result<Workload> {
    let state = current_state(session, workload_name)?;
    assign(&state, workload_name, agent)
}

/// Submits a prepared workload and takes the first scheduled instance
pub fn submit<S: ControlSession + ?Sized>(
    session: &S,
    workload: &Workload,
) -> Result<(WorkloadInstanceName, UpdateStateResponse)> {
    let response = session.apply_workload(workload)?;

    let instance = response.added_workloads.first().cloned().ok_or_else(|| {
        ClientError::InvalidResponse(format!(
            "applying '{}' did not schedule any instance",
            workload.name()
        ))
    })?;

    info!("Applied workload, instance: {}", instance);
    Ok((instance, response))
}

/// Assigns `workload_name` to `agent`, submits it and returns the instance
pub fn apply<S: ControlSession + ?Sized>(
    session: &S,
    workload_name: &str,
    agent: &str,
) -> Result<WorkloadInstanceName> {
    let workload = prepare(session, workload_name, agent)?;
    let (instance, _) = submit(session, &workload)?;
    Ok(instance)
}

/// Blocks until `instance` is RUNNING or `timeout` elapses
pub fn await_running<S: ControlSession + ?Sized>(
    session: &S,
    instance: &WorkloadInstanceName,
    timeout: Duration,
) -> Result<WaitOutcome> {
    await_running_with(session, instance, timeout, |_| {})
}

/// [`await_running`] that reports intermediate states to `progress`
///
/// Intermediate states, `StartingFailed` included, are only reported; the
/// wait goes on until RUNNING or the timeout.
pub fn await_running_with<S, F>(
    session: &S,
    instance: &WorkloadInstanceName,
    timeout: Duration,
    mut progress: F,
) -> Result<WaitOutcome>
where
    S: ControlSession + ?Sized,
    F: FnMut(&ExecutionState),
{
    let reached = session.wait_with_progress(
        instance,
        ExecutionStateEnum::Running,
        timeout,
        &mut progress,
    )?;

    let outcome = match reached {
        Some(_) => WaitOutcome::Running,
        None => WaitOutcome::Timeout,
    };
    info!("Workload {} finished waiting: {}", instance, outcome);
    Ok(outcome)
}
