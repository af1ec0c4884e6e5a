//! Configuration module
//!
//! Handles how the CLI reaches the orchestrator through `ank`.

use std::time::Duration;

use anklet_client::AnkCli;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path or name of the `ank` binary
    pub ank_path: String,

    /// Orchestrator URL handed to `ank --server-url`
    pub server_url: Option<String>,

    /// Skip TLS verification towards the orchestrator
    pub insecure: bool,

    /// Bound for each `ank` invocation
    pub command_timeout: Duration,
}

impl Config {
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
}
