//! Server configuration
//!
//! Defines the bind address, how the orchestrator is reached and what a
//! trigger does.

use std::net::SocketAddr;
use std::time::Duration;

use anklet_client::AnkCli;
use anklet_client::workflow::{DEFAULT_AGENT, DEFAULT_WORKLOAD, TriggerRequest};

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP/WebSocket listener binds to
    pub bind_addr: String,

    /// Path or name of the `ank` binary
    pub ank_path: String,

    /// Orchestrator URL handed to `ank --server-url`
    pub server_url: Option<String>,

    /// Skip TLS verification towards the orchestrator
    pub insecure: bool,

    /// Pending workload that a trigger schedules
    pub workload: String,

    /// Agent the workload is assigned to
    pub agent: String,

    /// How long a session waits for RUNNING
    pub wait_timeout: Duration,

    /// Bound for each `ank` invocation
    pub command_timeout: Duration,

    /// Maximum number of concurrently running sessions
    pub max_sessions: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5500".to_string(),
            ank_path: "ank".to_string(),
            server_url: None,
            insecure: false,
            workload: DEFAULT_WORKLOAD.to_string(),
            agent: DEFAULT_AGENT.to_string(),
            wait_timeout: Duration::from_secs(30),
            command_timeout: Duration::from_secs(10),
            max_sessions: 16,
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Every variable is optional:
    /// - ANKLET_BIND_ADDR (default: 0.0.0.0:5500)
    /// - ANKLET_ANK_PATH (default: ank)
    /// - ANKLET_SERVER_URL
    /// - ANKLET_INSECURE (true/false, default: false)
    /// - ANKLET_WORKLOAD (default: symphony)
    /// - ANKLET_AGENT (default: agent_A)
    /// - ANKLET_WAIT_TIMEOUT (seconds, default: 30)
    /// - ANKLET_COMMAND_TIMEOUT (seconds, default: 10)
    /// - ANKLET_MAX_SESSIONS (default: 16)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: env_string("ANKLET_BIND_ADDR").unwrap_or(defaults.bind_addr),
            ank_path: env_string("ANKLET_ANK_PATH").unwrap_or(defaults.ank_path),
            server_url: env_string("ANKLET_SERVER_URL"),
            insecure: env_string("ANKLET_INSECURE")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.insecure),
            workload: env_string("ANKLET_WORKLOAD").unwrap_or(defaults.workload),
            agent: env_string("ANKLET_AGENT").unwrap_or(defaults.agent),
            wait_timeout: env_secs("ANKLET_WAIT_TIMEOUT").unwrap_or(defaults.wait_timeout),
            command_timeout: env_secs("ANKLET_COMMAND_TIMEOUT")
                .unwrap_or(defaults.command_timeout),
            max_sessions: env_string("ANKLET_MAX_SESSIONS")
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(defaults.max_sessions),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("bind_addr '{}' is invalid: {}", self.bind_addr, e))?;

        if self.ank_path.is_empty() {
            anyhow::bail!("ank_path cannot be empty");
        }

        for (key, value) in [("workload", &self.workload), ("agent", &self.agent)] {
            if value.is_empty() || value.contains('.') {
                anyhow::bail!("{} must be non-empty and must not contain '.'", key);
            }
        }

        if self.wait_timeout.is_zero() {
            anyhow::bail!("wait_timeout must be greater than 0");
        }

        if self.command_timeout.is_zero() {
            anyhow::bail!("command_timeout must be greater than 0");
        }

        if self.max_sessions == 0 {
            anyhow::bail!("max_sessions must be greater than 0");
        }

        Ok(())
    }

    /// Connector for the configured `ank` binary
    pub fn connector(&self) -> AnkCli {
        let mut cli = AnkCli::new(&self.ank_path)
            .with_insecure(self.insecure)
            .with_command_timeout(self.command_timeout);
        if let Some(url) = &self.server_url {
            cli = cli.with_server_url(url);
        }
        cli
    }

    /// What every trigger session does
    pub fn trigger_request(&self) -> TriggerRequest {
        TriggerRequest::new(&self.workload, &self.agent, self.wait_timeout)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_string(key)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
