//! Orchestrator state tree
//!
//! The subset of the Ankaios complete state that the tools consume, in the
//! shape `ank get state -o json` prints it. Any part may be missing when the
//! query was limited by field masks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::instance::WorkloadInstanceName;
use crate::domain::state::ExecutionState;
use crate::domain::workload::Workload;

/// Instance id -> execution state
pub type InstanceStates = BTreeMap<String, ExecutionState>;

/// Agent -> workload name -> instance id -> execution state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkloadStatesMap(pub BTreeMap<String, BTreeMap<String, InstanceStates>>);

impl WorkloadStatesMap {
    /// All instances of a workload known on one agent
    pub fn instances_of(&self, workload_name: &str, agent_name: &str) -> Vec<WorkloadInstanceName> {
        self.0
            .get(agent_name)
            .and_then(|workloads| workloads.get(workload_name))
            .map(|instances| {
                instances
                    .keys()
                    .filter_map(|id| WorkloadInstanceName::new(workload_name, id, agent_name).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Execution state of exactly one instance
    pub fn get_for_instance_name(&self, instance: &WorkloadInstanceName) -> Option<&ExecutionState> {
        self.0
            .get(instance.agent_name())?
            .get(instance.workload_name())?
            .get(instance.id())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Desired state: what the orchestrator should be running
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesiredState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(default)]
    pub workloads: BTreeMap<String, Workload>,
}

/// Complete state as reported by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteState {
    #[serde(default)]
    pub desired_state: DesiredState,

    #[serde(default)]
    pub workload_states: WorkloadStatesMap,
}

impl CompleteState {
    /// Looks up one workload descriptor by name
    ///
    /// The returned copy carries its name, which the state tree only stores
    /// as the map key.
    pub fn get_workload(&self, name: &str) -> Option<Workload> {
        self.desired_state
            .workloads
            .get(name)
            .cloned()
            .map(|workload| workload.with_name(name))
    }
}

/// Orchestrator answer to a state update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStateResponse {
    /// Instances scheduled by the update
    #[serde(default)]
    pub added_workloads: Vec<WorkloadInstanceName>,

    /// Instances removed by the update
    #[serde(default)]
    pub deleted_workloads: Vec<WorkloadInstanceName>,
}
