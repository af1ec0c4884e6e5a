//! Execution state types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sub-state the orchestrator reports when a workload could not be started
pub const STARTING_FAILED_SUBSTATE: &str = "StartingFailed";

/// Top-level execution state of a workload instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionStateEnum {
    AgentDisconnected,
    Pending,
    Starting,
    Running,
    Stopping,
    Succeeded,
    Failed,
    NotScheduled,
    Removed,
}

impl fmt::Display for ExecutionStateEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AgentDisconnected => "AgentDisconnected",
            Self::Pending => "Pending",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::NotScheduled => "NotScheduled",
            Self::Removed => "Removed",
        };
        f.write_str(name)
    }
}

/// Point-in-time execution state of one workload instance
///
/// A snapshot only: it is re-fetched on every query and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    pub state: ExecutionStateEnum,
    #[serde(default)]
    pub sub_state: String,
    #[serde(default)]
    pub additional_info: String,
}

impl ExecutionState {
    pub fn new(state: ExecutionStateEnum, sub_state: impl Into<String>) -> Self {
        Self {
            state,
            sub_state: sub_state.into(),
            additional_info: String::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.state == ExecutionStateEnum::Running
    }

    /// Whether the orchestrator gave up starting or running the instance
    pub fn is_failure(&self) -> bool {
        self.state == ExecutionStateEnum::Failed || self.sub_state == STARTING_FAILED_SUBSTATE
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.state)?;
        if !self.sub_state.is_empty() {
            write!(f, "({})", self.sub_state)?;
        }
        if !self.additional_info.is_empty() {
            write!(f, ": {}", self.additional_info)?;
        }
        Ok(())
    }
}

/// Result of waiting for an instance to reach RUNNING
///
/// Timeout is an outcome, not an error; transport failures while waiting are
/// reported separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WaitOutcome {
    Running,
    Timeout,
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => f.write_str("RUNNING"),
            Self::Timeout => f.write_str("TIMEOUT"),
        }
    }
}
