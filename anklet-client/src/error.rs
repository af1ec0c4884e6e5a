//! Error types for the Anklet client

use std::time::Duration;

use anklet_core::domain::instance::InstanceNameError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the orchestrator
#[derive(Debug, Error)]
pub enum ClientError {
    /// The orchestrator could not be reached or rejected the request
    #[error("backend error: {0}")]
    Backend(String),

    /// An `ank` command did not finish in time
    #[error("command `{command}` timed out after {timeout:?}")]
    CommandTimeout {
        /// Command line that was run
        command: String,
        /// Bound that was exceeded
        timeout: Duration,
    },

    /// Spawning or talking to a child process failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session was released and accepts no further calls
    #[error("session closed")]
    SessionClosed,

    /// Expected workload or field missing from the orchestrator's state
    #[error("not found: {0}")]
    NotFound(String),

    /// Orchestrator accepted a request but its answer breaks the contract
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Orchestrator output could not be parsed
    #[error("failed to parse orchestrator output: {0}")]
    ParseError(String),

    /// Caller supplied something the orchestrator cannot accept
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error comes from the transport rather than the data
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::CommandTimeout { .. } | Self::Io(_) | Self::SessionClosed
        )
    }
}

impl From<InstanceNameError> for ClientError {
    fn from(err: InstanceNameError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ClientError::NotFound("symphony".into()).is_not_found());
        assert!(!ClientError::NotFound("symphony".into()).is_backend());
        assert!(ClientError::Backend("connection refused".into()).is_backend());
        assert!(ClientError::SessionClosed.is_backend());
        assert!(!ClientError::InvalidResponse("no instance".into()).is_backend());
    }

    #[test]
    fn test_instance_name_error_is_invalid_request() {
        let err: ClientError = InstanceNameError::Unscheduled("symphony".into()).into();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }
}
