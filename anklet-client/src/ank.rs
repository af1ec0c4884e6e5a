//! `ank` CLI backend
//!
//! Talks to the orchestrator by running the `ank` command-line client:
//! - `ank get state -o json <masks>` for state queries
//! - `ank set state -f <file> <mask>` to submit a workload descriptor
//!
//! Newly scheduled instances are read back from `workloadStates`, where the
//! orchestrator records every added instance before answering the update.
//! Only ids absent before the update count as added.

use std::io::Write;
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anklet_core::domain::complete_state::{CompleteState, UpdateStateResponse};
use anklet_core::domain::field_mask::FieldMask;
use anklet_core::domain::instance::WorkloadInstanceName;
use anklet_core::domain::state::ExecutionState;
use anklet_core::domain::workload::Workload;
use serde_json::{Map, json};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::exec;
use crate::session::{Connector, ControlSession};

/// Default bound for a single `ank` invocation
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the `ank` CLI
#[derive(Debug, Clone)]
pub struct AnkCli {
    /// Path or name of the `ank` binary
    pub binary: String,

    /// Orchestrator URL, passed as `--server-url` when set
    pub server_url: Option<String>,

    /// Pass `--insecure` to skip TLS verification
    pub insecure: bool,

    /// Bound for each `ank` invocation
    pub command_timeout: Duration,
}

impl AnkCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            server_url: None,
            insecure: false,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// `ank` invocation with the global options applied
    pub fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(url) = &self.server_url {
            command.arg("--server-url").arg(url);
        }
        if self.insecure {
            command.arg("--insecure");
        }
        command
    }
}

impl Default for AnkCli {
    fn default() -> Self {
        Self::new("ank")
    }
}

impl Connector for AnkCli {
    type Session = AnkSession;

    fn connect(&self) -> Result<AnkSession> {
        Ok(AnkSession::open(self.clone()))
    }
}

/// Handle that closes an [`AnkSession`] from another thread
#[derive(Debug, Clone)]
pub struct SessionHandle {
    closed: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Closes the session: the running `ank` call is killed and further
    /// calls fail with [`ClientError::SessionClosed`]
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Session backed by the `ank` CLI
#[derive(Debug)]
pub struct AnkSession {
    cli: AnkCli,
    closed: Arc<AtomicBool>,
}

impl AnkSession {
    fn open(cli: AnkCli) -> Self {
        debug!("Opened ank session ({})", cli.binary);
        Self {
            cli,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            closed: Arc::clone(&self.closed),
        }
    }

    fn run(&self, command: Command) -> Result<String> {
        if self.is_closed() {
            return Err(ClientError::SessionClosed);
        }
        let line = exec::describe(&command);
        exec::run(command, self.cli.command_timeout, &self.closed)?.into_success(&line)
    }
}

impl ControlSession for AnkSession {
    fn get_state(&self, field_masks: &[FieldMask]) -> Result<CompleteState> {
        let mut command = self.cli.command();
        command.args(["get", "state", "-o", "json"]).args(field_masks);

        let stdout = self.run(command)?;
        parse_state(&stdout)
    }

    fn apply_workload(&self, workload: &Workload) -> Result<UpdateStateResponse> {
        let agent = workload.agent().ok_or_else(|| {
            ClientError::InvalidRequest(format!(
                "workload '{}' has no agent assigned",
                workload.name()
            ))
        })?;

        let states_mask = FieldMask::workload_states(agent, workload.name());
        let known = self
            .get_state(std::slice::from_ref(&states_mask))?
            .workload_states
            .instances_of(workload.name(), agent);

        let mut workloads = Map::new();
        workloads.insert(workload.name().to_string(), workload.to_descriptor());
        let state = json!({ "desiredState": { "workloads": workloads } });

        // JSON is valid YAML, which is what `ank set state` reads
        let mut file = tempfile::Builder::new()
            .prefix("anklet-state-")
            .suffix(".yaml")
            .tempfile()?;
        serde_json::to_writer_pretty(&mut file, &state)?;
        file.flush()?;

        let mut command = self.cli.command();
        command
            .args(["set", "state", "-f"])
            .arg(file.path())
            .arg(FieldMask::desired_workload(workload.name()));
        self.run(command)?;

        info!("Applied workload {} to agent {}", workload.name(), agent);

        let added_workloads = self
            .get_state(&[states_mask])?
            .workload_states
            .instances_of(workload.name(), agent)
            .into_iter()
            .filter(|instance| !known.contains(instance))
            .collect();

        Ok(UpdateStateResponse {
            added_workloads,
            deleted_workloads: Vec::new(),
        })
    }

    fn get_execution_state(&self, instance: &WorkloadInstanceName) -> Result<Option<ExecutionState>> {
        let states = self.get_state(&[FieldMask::instance_state(instance)])?;
        Ok(states.workload_states.get_for_instance_name(instance).cloned())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for AnkSession {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!("Released ank session");
    }
}

/// Parses `ank get state -o json` output; empty output means an empty state
fn parse_state(stdout: &str) -> Result<CompleteState> {
    if stdout.trim().is_empty() {
        return Ok(CompleteState::default());
    }
    serde_json::from_str(stdout).map_err(|e| ClientError::ParseError(format!("state: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_global_options() {
        let cli = AnkCli::new("/usr/local/bin/ank")
            .with_server_url("https://127.0.0.1:25551")
            .with_insecure(true);

        assert_eq!(
            exec::describe(&cli.command()),
            "/usr/local/bin/ank --server-url https://127.0.0.1:25551 --insecure"
        );
        assert_eq!(exec::describe(&AnkCli::default().command()), "ank");
    }

    #[test]
    fn test_parse_state() {
        let state = parse_state(
            r#"{"desiredState":{"apiVersion":"v0.1","workloads":{"symphony":{"agent":"","runtime":"podman"}}},"workloadStates":{}}"#,
        )
        .unwrap();
        assert!(state.get_workload("symphony").is_some());

        assert_eq!(parse_state("  \n").unwrap(), CompleteState::default());
        assert!(matches!(parse_state("not json"), Err(ClientError::ParseError(_))));
    }

    #[test]
    fn test_apply_requires_agent() {
        let session = AnkCli::new("/nonexistent/ank").connect().unwrap();
        let err = session.apply_workload(&Workload::new("symphony")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[test]
    fn test_closed_session_rejects_calls() {
        let session = AnkCli::new("/nonexistent/ank").connect().unwrap();
        session.handle().close();

        assert!(session.is_closed());
        assert!(matches!(session.get_state(&[]), Err(ClientError::SessionClosed)));
    }

    #[test]
    fn test_unreachable_backend() {
        let session = AnkCli::new("/nonexistent/ank").connect().unwrap();
        let err = session.get_state(&[FieldMask::desired_workload("symphony")]).unwrap_err();
        assert!(err.is_backend());
    }

    /// Writes an executable `ank` stand-in into `dir`
    ///
    /// `set` touches `applied` next to the script. `get` prints `before` until
    /// then and `after` once it exists.
    #[cfg(unix)]
    fn fake_ank(dir: &std::path::Path, before: &str, after: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("ank");
        let marker = dir.join("applied");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 set) touch '{marker}' ;;\n\
                 get) if [ -e '{marker}' ]; then echo '{after}'; else echo '{before}'; fi ;;\n\
                 esac\n",
                marker = marker.display(),
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        script.to_string_lossy().into_owned()
    }

    #[cfg(unix)]
    fn scheduled_workload() -> Workload {
        let mut workload = Workload::new("symphony");
        workload.update_agent_name("agent_A");
        workload
    }

    #[cfg(unix)]
    #[test]
    fn test_reads_new_instances_from_fake_ank() {
        let dir = tempfile::tempdir().unwrap();
        let ank = fake_ank(
            dir.path(),
            r#"{"workloadStates":{}}"#,
            r#"{"workloadStates":{"agent_A":{"symphony":{"7f3":{"state":"Pending","subState":"Initial"}}}}}"#,
        );

        let session = AnkCli::new(ank).connect().unwrap();
        let response = session.apply_workload(&scheduled_workload()).unwrap();
        assert_eq!(response.added_workloads.len(), 1);
        assert_eq!(response.added_workloads[0].to_string(), "symphony.7f3.agent_A");

        let state = session
            .get_execution_state(&response.added_workloads[0])
            .unwrap()
            .unwrap();
        assert_eq!(state.sub_state, "Initial");
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_instances_are_not_added() {
        let running = r#"{"workloadStates":{"agent_A":{"symphony":{"0aa":{"state":"Running","subState":"Ok"}}}}}"#;
        let dir = tempfile::tempdir().unwrap();
        let ank = fake_ank(dir.path(), running, running);

        let session = AnkCli::new(ank).connect().unwrap();
        let response = session.apply_workload(&scheduled_workload()).unwrap();

        assert!(response.added_workloads.is_empty());
        let err = crate::workflow::submit(&session, &scheduled_workload()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_already_scheduled_workload_is_not_submitted() {
        let state = r#"{"desiredState":{"workloads":{"symphony":{"agent":"agent_A","runtime":"podman"}}},"workloadStates":{"agent_A":{"symphony":{"0aa":{"state":"Running","subState":"Ok"}}}}}"#;
        let dir = tempfile::tempdir().unwrap();
        let ank = fake_ank(dir.path(), state, state);

        let session = AnkCli::new(ank).connect().unwrap();
        let err = crate::workflow::apply(&session, "symphony", "agent_A").unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(_)));
        assert!(!dir.path().join("applied").exists());
    }
}
