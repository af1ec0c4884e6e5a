//! Orchestrator session abstraction
//!
//! A session is a scoped connection to the orchestrator's control interface.
//! It is opened through a [`Connector`] and released when dropped, on every
//! exit path. All calls block the current thread; async callers run them on
//! the blocking pool.
//!
//! Both traits exist so the workflow can be driven by the `ank` backend in
//! production and by scripted fakes in tests.

use std::thread;
use std::time::{Duration, Instant};

use anklet_core::domain::complete_state::{CompleteState, UpdateStateResponse};
use anklet_core::domain::field_mask::FieldMask;
use anklet_core::domain::instance::WorkloadInstanceName;
use anklet_core::domain::state::{ExecutionState, ExecutionStateEnum};
use anklet_core::domain::workload::Workload;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Default delay between two execution-state observations
pub const DEFAULT_STATE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Opens orchestrator sessions
pub trait Connector: Send + Sync + 'static {
    type Session: ControlSession + 'static;

    /// Opens a new session; it is released when the returned value is dropped
    fn connect(&self) -> Result<Self::Session>;
}

/// Operations offered by an open orchestrator session
pub trait ControlSession: Send {
    /// Fetches the orchestrator state limited to `field_masks`
    fn get_state(&self, field_masks: &[FieldMask]) -> Result<CompleteState>;

    /// Submits one workload descriptor and returns the instances it scheduled
    fn apply_workload(&self, workload: &Workload) -> Result<UpdateStateResponse>;

    /// Current execution state of one instance, `None` if the orchestrator
    /// does not know it (yet)
    fn get_execution_state(&self, instance: &WorkloadInstanceName) -> Result<Option<ExecutionState>>;

    /// Whether the session was closed from another thread
    fn is_closed(&self) -> bool {
        false
    }

    /// Delay between two observations while waiting for a state
    fn state_poll_interval(&self) -> Duration {
        DEFAULT_STATE_POLL_INTERVAL
    }

    /// Blocks until `instance` is observed in `target` or `timeout` elapses
    ///
    /// Returns the observed state, or `None` once the full timeout has
    /// passed without observing it. Errors while observing are returned as
    /// they happen and end the wait.
    fn wait_for_workload_to_reach_state(
        &self,
        instance: &WorkloadInstanceName,
        target: ExecutionStateEnum,
        timeout: Duration,
    ) -> Result<Option<ExecutionState>> {
        self.wait_with_progress(instance, target, timeout, &mut |_| {})
    }

    /// Like [`wait_for_workload_to_reach_state`](Self::wait_for_workload_to_reach_state),
    /// calling `progress` for every observed state change before the target
    fn wait_with_progress(
        &self,
        instance: &WorkloadInstanceName,
        target: ExecutionStateEnum,
        timeout: Duration,
        progress: &mut dyn FnMut(&ExecutionState),
    ) -> Result<Option<ExecutionState>> {
        // a timeout too large to represent never expires
        let deadline = Instant::now().checked_add(timeout);
        let mut last_seen: Option<ExecutionState> = None;

        loop {
            if self.is_closed() {
                return Err(ClientError::SessionClosed);
            }

            if let Some(state) = self.get_execution_state(instance)? {
                if state.state == target {
                    return Ok(Some(state));
                }

                if last_seen.as_ref() != Some(&state) {
                    if state.is_failure() {
                        warn!("Instance {} reported {}", instance, state);
                    } else {
                        debug!("Instance {} is {}", instance, state);
                    }
                    progress(&state);
                    last_seen = Some(state);
                }
            }

            let mut pause = self.state_poll_interval();
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                pause = pause.min(deadline - now);
            }
            thread::sleep(pause);
        }
    }
}
