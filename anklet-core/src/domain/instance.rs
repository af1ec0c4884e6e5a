//! Workload instance names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when an instance name cannot be built or parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceNameError {
    #[error("workload '{0}' has no agent assigned and cannot have an instance")]
    Unscheduled(String),

    #[error("instance name part '{0}' must not be empty or contain '.'")]
    InvalidPart(String),

    #[error("malformed instance name '{0}', expected <workload>.<id>.<agent>")]
    Malformed(String),
}

/// Identifier of one scheduled instance of a workload
///
/// Issued by the orchestrator once a workload is assigned to an agent. It is
/// the key for execution-state queries and never changes once issued.
/// Rendered as `<workload>.<id>.<agent>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkloadInstanceName {
    workload_name: String,
    id: String,
    agent_name: String,
}

impl WorkloadInstanceName {
    /// Builds an instance name
    ///
    /// Fails if the agent is empty: an unscheduled workload has no instance.
    pub fn new(
        workload_name: impl Into<String>,
        id: impl Into<String>,
        agent_name: impl Into<String>,
    ) -> Result<Self, InstanceNameError> {
        let workload_name = workload_name.into();
        let agent_name = agent_name.into();
        if agent_name.is_empty() {
            return Err(InstanceNameError::Unscheduled(workload_name));
        }

        let id = id.into();
        for part in [&workload_name, &id, &agent_name] {
            if part.is_empty() || part.contains('.') {
                return Err(InstanceNameError::InvalidPart(part.clone()));
            }
        }

        Ok(Self {
            workload_name,
            id,
            agent_name,
        })
    }

    pub fn workload_name(&self) -> &str {
        &self.workload_name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }
}

impl fmt::Display for WorkloadInstanceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.workload_name, self.id, self.agent_name)
    }
}

impl FromStr for WorkloadInstanceName {
    type Err = InstanceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [workload, id, agent] => Self::new(*workload, *id, *agent),
            _ => Err(InstanceNameError::Malformed(s.to_string())),
        }
    }
}

impl TryFrom<String> for WorkloadInstanceName {
    type Error = InstanceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkloadInstanceName> for String {
    fn from(value: WorkloadInstanceName) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let name = WorkloadInstanceName::new("symphony", "7f3a", "agent_A").unwrap();
        assert_eq!(name.to_string(), "symphony.7f3a.agent_A");

        let parsed: WorkloadInstanceName = "symphony.7f3a.agent_A".parse().unwrap();
        assert_eq!(parsed, name);
        assert_eq!(parsed.workload_name(), "symphony");
        assert_eq!(parsed.id(), "7f3a");
        assert_eq!(parsed.agent_name(), "agent_A");
    }

    #[test]
    fn test_unscheduled_workload_fails_fast() {
        let err = WorkloadInstanceName::new("symphony", "7f3a", "").unwrap_err();
        assert_eq!(err, InstanceNameError::Unscheduled("symphony".to_string()));
    }

    #[test]
    fn test_malformed_names() {
        assert!("symphony".parse::<WorkloadInstanceName>().is_err());
        assert!("symphony.7f3a".parse::<WorkloadInstanceName>().is_err());
        assert!("a.b.c.d".parse::<WorkloadInstanceName>().is_err());
        assert!("symphony..agent_A".parse::<WorkloadInstanceName>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let name = WorkloadInstanceName::new("symphony", "7f3a", "agent_A").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"symphony.7f3a.agent_A\"");

        let back: WorkloadInstanceName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
