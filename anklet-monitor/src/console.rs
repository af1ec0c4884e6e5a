//! Interactive controls read from stdin

use std::str::FromStr;

/// Operator command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "Commands: start, stop, refresh, help, quit";

impl FromStr for Control {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Control::Start),
            "stop" | "x" => Ok(Control::Stop),
            "refresh" | "r" => Ok(Control::Refresh),
            "help" | "h" | "?" => Ok(Control::Help),
            "quit" | "q" | "exit" => Ok(Control::Quit),
            other => anyhow::bail!("Unknown command '{}'. {}", other, HELP),
        }
    }
}
