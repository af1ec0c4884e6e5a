//! Field masks for filtered state queries

use std::fmt;

use crate::domain::instance::WorkloadInstanceName;

/// Path into the orchestrator's state tree, e.g. `desiredState.workloads.symphony`
///
/// A state query limited by field masks only returns the named subtrees.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldMask(String);

impl FieldMask {
    /// Mask selecting one workload's desired-state descriptor
    pub fn desired_workload(workload_name: &str) -> Self {
        Self(format!("desiredState.workloads.{workload_name}"))
    }

    /// Mask selecting all execution states of a workload on one agent
    pub fn workload_states(agent_name: &str, workload_name: &str) -> Self {
        Self(format!("workloadStates.{agent_name}.{workload_name}"))
    }

    /// Mask selecting the execution state of exactly one instance
    pub fn instance_state(instance: &WorkloadInstanceName) -> Self {
        Self(format!(
            "workloadStates.{}.{}.{}",
            instance.agent_name(),
            instance.workload_name(),
            instance.id()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<std::ffi::OsStr> for FieldMask {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}
