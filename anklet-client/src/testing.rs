//! In-memory orchestrator for tests
//!
//! Scripts what the orchestrator reports so the workflow and the binaries
//! built on it can be exercised without a running cluster.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anklet_core::domain::complete_state::{CompleteState, UpdateStateResponse};
use anklet_core::domain::field_mask::FieldMask;
use anklet_core::domain::instance::WorkloadInstanceName;
use anklet_core::domain::state::{ExecutionState, ExecutionStateEnum};
use anklet_core::domain::workload::Workload;
use serde_json::json;

use crate::error::{ClientError, Result};
use crate::session::{Connector, ControlSession};

/// `n` pending observations followed by RUNNING
pub fn running_after(n: usize) -> Vec<Option<ExecutionState>> {
    let mut states: Vec<Option<ExecutionState>> = (0..n)
        .map(|_| Some(ExecutionState::new(ExecutionStateEnum::Pending, "Initial")))
        .collect();
    states.push(Some(ExecutionState::new(ExecutionStateEnum::Running, "Ok")));
    states
}

#[derive(Debug, Default)]
struct Inner {
    state: CompleteState,
    scheduled_ids: Vec<String>,
    /// Replayed by `get_execution_state`; the last entry repeats forever
    states: VecDeque<Option<ExecutionState>>,
    unreachable: bool,
    /// Apply succeeds but every execution-state query fails
    observation_fails: bool,
    applied: Vec<Workload>,
}

/// Scripted orchestrator; clones share the same script and counters
#[derive(Debug, Clone)]
pub struct FakeOrchestrator {
    inner: Arc<Mutex<Inner>>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    observations: Arc<AtomicUsize>,
    poll_interval: Duration,
}

impl FakeOrchestrator {
    /// Orchestrator with an empty desired state
    pub fn empty() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                scheduled_ids: vec!["7f3".to_string()],
                ..Inner::default()
            })),
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
            observations: Arc::new(AtomicUsize::new(0)),
            poll_interval: Duration::from_millis(10),
        }
    }

    /// Orchestrator holding one unscheduled workload
    pub fn with_pending(workload_name: &str) -> Self {
        let fake = Self::empty();
        let workload: Workload = serde_json::from_value(json!({
            "agent": "",
            "runtime": "podman",
            "restartPolicy": "NEVER",
            "runtimeConfig": "image: ghcr.io/eclipse-symphony/symphony-api:latest\n"
        }))
        .unwrap_or_else(|_| Workload::new(workload_name));
        fake.lock()
            .state
            .desired_state
            .workloads
            .insert(workload_name.to_string(), workload);
        fake
    }

    /// Orchestrator whose every call fails with a backend error
    pub fn unreachable() -> Self {
        let fake = Self::with_pending("symphony");
        fake.lock().unreachable = true;
        fake
    }

    /// Orchestrator that accepts the apply and loses the connection afterwards
    pub fn failing_after_apply() -> Self {
        let fake = Self::with_pending("symphony");
        fake.lock().observation_fails = true;
        fake
    }

    /// Instance ids reported for every applied workload
    pub fn scheduling(self, ids: &[&str]) -> Self {
        self.lock().scheduled_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// Execution states replayed to observers
    pub fn with_states(self, states: Vec<Option<ExecutionState>>) -> Self {
        self.lock().states = states.into();
        self
    }

    /// Opens a session directly
    pub fn session(&self) -> FakeSession {
        self.opened.fetch_add(1, Ordering::SeqCst);
        FakeSession { fake: self.clone() }
    }

    /// Workloads submitted so far
    pub fn applied(&self) -> Vec<Workload> {
        self.lock().applied.clone()
    }

    pub fn sessions_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sessions_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of execution-state queries answered
    pub fn observations(&self) -> usize {
        self.observations.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_reachable(&self) -> Result<()> {
        if self.lock().unreachable {
            return Err(ClientError::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

impl Connector for FakeOrchestrator {
    type Session = FakeSession;

    fn connect(&self) -> Result<FakeSession> {
        Ok(self.session())
    }
}

/// Session on a [`FakeOrchestrator`]
#[derive(Debug)]
pub struct FakeSession {
    fake: FakeOrchestrator,
}

impl ControlSession for FakeSession {
    fn get_state(&self, _field_masks: &[FieldMask]) -> Result<CompleteState> {
        self.fake.check_reachable()?;
        Ok(self.fake.lock().state.clone())
    }

    fn apply_workload(&self, workload: &Workload) -> Result<UpdateStateResponse> {
        self.fake.check_reachable()?;
        let agent = workload.agent().unwrap_or_default();

        let mut inner = self.fake.lock();
        inner.applied.push(workload.clone());
        let added_workloads = inner
            .scheduled_ids
            .iter()
            .map(|id| WorkloadInstanceName::new(workload.name(), id.as_str(), agent))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(UpdateStateResponse {
            added_workloads,
            deleted_workloads: Vec::new(),
        })
    }

    fn get_execution_state(&self, _instance: &WorkloadInstanceName) -> Result<Option<ExecutionState>> {
        self.fake.check_reachable()?;
        self.fake.observations.fetch_add(1, Ordering::SeqCst);

        let mut inner = self.fake.lock();
        if inner.observation_fails {
            return Err(ClientError::Backend("connection lost".to_string()));
        }
        if inner.states.len() > 1 {
            Ok(inner.states.pop_front().flatten())
        } else {
            Ok(inner.states.front().cloned().flatten())
        }
    }

    fn state_poll_interval(&self) -> Duration {
        self.fake.poll_interval
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.fake.released.fetch_add(1, Ordering::SeqCst);
    }
}
