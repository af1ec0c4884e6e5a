//! Anklet Monitor
//!
//! Terminal viewer for an Ankaios fleet. Polls `ank get workloads` and
//! `ank get state` on a fixed interval and shows the overview next to the
//! lines that report failed workloads.
//!
//! Architecture:
//! - Configuration: settings from environment or defaults
//! - Source: runs the `ank` status queries
//! - Poller: periodic refresh publishing whole snapshots
//! - View: single consumer rendering every snapshot
//! - Console: start/stop/refresh/quit controls on stdin

mod config;
mod console;
mod monitor;
mod view;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::console::{Control, HELP};
use crate::monitor::{AnkStatusSource, Monitor};

#[derive(Parser)]
#[command(name = "anklet-monitor")]
#[command(about = "Ankaios workload monitor", long_about = None)]
struct Args {
    /// Refresh once, print the result and exit
    #[arg(long)]
    once: bool,

    /// Start monitoring right away instead of waiting for `start`
    #[arg(long, conflicts_with = "once")]
    start: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so they do not mix with the rendered view
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anklet_monitor=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config()?;
    info!(
        "Loaded configuration: ank={}, poll_interval={:?}, query_timeout={:?}",
        config.ank_path, config.poll_interval, config.query_timeout
    );

    let monitor = Monitor::new(AnkStatusSource::new(config.ank_cli()), config.poll_interval);

    if args.once {
        let snapshot = monitor.refresh_now().await;
        print!("{}", view::render(&snapshot));
        return Ok(());
    }

    let renderer = tokio::spawn(view::run(monitor.subscribe()));

    view::status("Ready to start monitoring...");
    println!("{}", HELP);
    if args.start {
        start(&monitor);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => break,
        };

        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Control>() {
            Ok(Control::Start) => start(&monitor),
            Ok(Control::Stop) => {
                if monitor.stop() {
                    view::status("Monitoring stopped");
                }
            }
            Ok(Control::Refresh) => {
                monitor.refresh_now().await;
            }
            Ok(Control::Help) => {
                let state = if monitor.is_running() { "running" } else { "stopped" };
                println!("{} (monitoring is {})", HELP, state);
            }
            Ok(Control::Quit) => break,
            Err(e) => view::error(&e.to_string()),
        }
    }

    monitor.stop();
    renderer.abort();
    Ok(())
}

fn start(monitor: &Monitor<AnkStatusSource>) {
    if monitor.start() {
        view::status("Monitoring started...");
    }
}

/// Loads configuration from environment variables with fallback to defaults
fn load_config() -> Result<Config> {
    let config = Config::from_env();
    config.validate()?;
    Ok(config)
}
