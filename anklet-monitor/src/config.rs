//! Monitor configuration
//!
//! Defines how `ank` is invoked and how often the status is refreshed.

use std::time::Duration;

use anklet_client::AnkCli;

/// Longest accepted poll interval
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Monitor configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path or name of the `ank` binary
    pub ank_path: String,

    /// Orchestrator URL handed to `ank --server-url`
    pub server_url: Option<String>,

    /// Skip TLS verification towards the orchestrator
    pub insecure: bool,

    /// Delay between two refreshes while monitoring
    pub poll_interval: Duration,

    /// Bound for each status query
    pub query_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ank_path: "ank".to_string(),
            server_url: None,
            insecure: false,
            poll_interval: Duration::from_secs(5),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - ANKLET_ANK_PATH (optional, default: ank)
    /// - ANKLET_SERVER_URL (optional)
    /// - ANKLET_INSECURE (optional, true/false)
    /// - ANKLET_POLL_INTERVAL (optional, seconds, default: 5)
    /// - ANKLET_QUERY_TIMEOUT (optional, seconds, default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let ank_path = std::env::var("ANKLET_ANK_PATH")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.ank_path);

        let server_url = std::env::var("ANKLET_SERVER_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let insecure = std::env::var("ANKLET_INSECURE")
            .ok()
            .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.insecure);

        let poll_interval = std::env::var("ANKLET_POLL_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.poll_interval);

        let query_timeout = std::env::var("ANKLET_QUERY_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.query_timeout);

        Self {
            ank_path,
            server_url,
            insecure,
            poll_interval,
            query_timeout,
        }
    }

    /// `ank` invocation settings, bounded by the query timeout
    pub fn ank_cli(&self) -> AnkCli {
        let mut cli = AnkCli::new(&self.ank_path)
            .with_insecure(self.insecure)
            .with_command_timeout(self.query_timeout);
        if let Some(url) = &self.server_url {
            cli = cli.with_server_url(url);
        }
        cli
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ank_path.is_empty() {
            anyhow::bail!("ank_path cannot be empty");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.poll_interval > MAX_POLL_INTERVAL {
            anyhow::bail!("poll_interval must be at most {} seconds", MAX_POLL_INTERVAL.as_secs());
        }

        if self.query_timeout.is_zero() {
            anyhow::bail!("query_timeout must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.query_timeout, Duration::from_secs(10));
        assert_eq!(config.ank_path, "ank");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ank_cli_uses_query_timeout() {
        let config = Config {
            server_url: Some("https://127.0.0.1:25551".to_string()),
            query_timeout: Duration::from_secs(3),
            ..Config::default()
        };

        let cli = config.ank_cli();
        assert_eq!(cli.binary, "ank");
        assert_eq!(cli.server_url.as_deref(), Some("https://127.0.0.1:25551"));
        assert_eq!(cli.command_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(u64::MAX);
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(1);

        config.query_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
        config.query_timeout = Duration::from_secs(1);

        config.ank_path = String::new();
        assert!(config.validate().is_err());
    }
}
