//! Trigger session messages
//!
//! A trigger session sends `Triggered` once the workload is applied and then
//! exactly one terminal message before the connection is closed.

use serde::{Deserialize, Serialize};

use crate::domain::instance::WorkloadInstanceName;
use crate::domain::state::WaitOutcome;

/// Message pushed to a trigger-session client
///
/// Serialized as `{"status": "TRIGGERED", "instance": "..."}` or
/// `{"status": "ERROR", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionMessage {
    Triggered { instance: String },
    Running { instance: String },
    Timeout { instance: String },
    Error { message: String },
}

impl SessionMessage {
    pub fn triggered(instance: &WorkloadInstanceName) -> Self {
        Self::Triggered {
            instance: instance.to_string(),
        }
    }

    /// Terminal message for a finished wait
    pub fn from_outcome(outcome: WaitOutcome, instance: &WorkloadInstanceName) -> Self {
        let instance = instance.to_string();
        match outcome {
            WaitOutcome::Running => Self::Running { instance },
            WaitOutcome::Timeout => Self::Timeout { instance },
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Whether the session ends after this message
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Triggered { .. })
    }
}
