//! Status sources
//!
//! The monitor reads two opaque text blobs: the workload overview and the
//! detailed state. Output is never parsed beyond line filtering.

use std::process::Stdio;

use anklet_client::AnkCli;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Where the monitor reads its text from
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    /// Workload overview (`ank get workloads`)
    async fn overview(&self) -> Result<String>;

    /// Detailed state (`ank get state`)
    async fn detailed_state(&self) -> Result<String>;
}

/// Reads status by running the `ank` CLI
///
/// Each query is bounded by the CLI's command timeout.
#[derive(Debug, Clone)]
pub struct AnkStatusSource {
    cli: AnkCli,
}

impl AnkStatusSource {
    pub fn new(cli: AnkCli) -> Self {
        Self { cli }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::from(self.cli.command());
        command
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        command
    }

    /// Runs `ank <args>` and returns its stdout
    ///
    /// A run longer than the query timeout is killed. A non-zero exit is an
    /// error carrying stderr.
    async fn run(&self, args: &[&str]) -> Result<String> {
        let line = format!("{} {}", self.cli.binary, args.join(" "));
        debug!("Running {}", line);

        let timeout = self.cli.command_timeout;
        let output = tokio::time::timeout(timeout, self.command(args).output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Command '{}' timed out after {} seconds",
                    line,
                    timeout.as_secs_f32()
                )
            })?
            .with_context(|| format!("Failed to run '{}'", line))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("'{}' exited with {}: {}", line, output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl StatusSource for AnkStatusSource {
    async fn overview(&self) -> Result<String> {
        self.run(&["get", "workloads"]).await
    }

    async fn detailed_state(&self) -> Result<String> {
        self.run(&["get", "state"]).await
    }
}
