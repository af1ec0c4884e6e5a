//! Terminal rendering of monitor snapshots
//!
//! A single consumer prints every published snapshot in full, so the
//! overview and failure sections on screen always come from the same refresh.

use std::sync::Arc;

use colored::*;
use tokio::sync::watch;

use crate::monitor::Snapshot;
use crate::monitor::failures::NO_FAILURES;

/// Formats one snapshot
pub fn render(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    out.push_str(&format!("{}\n", "Workload Status Overview".bold().cyan()));
    out.push_str(snapshot.overview.trim_end());
    out.push_str("\n\n");

    out.push_str(&format!("{}\n", "Failed Workloads Details".bold().cyan()));
    if snapshot.failures == NO_FAILURES {
        out.push_str(&format!("{}\n", NO_FAILURES.green()));
    } else {
        for line in snapshot.failures.lines() {
            out.push_str(&format!("{}\n", line.red()));
        }
    }

    out.push_str(&format!(
        "\nLast updated: {}\n",
        snapshot.refreshed_at.format("%H:%M:%S")
    ));
    out
}

/// Prints a status line such as "Monitoring started..."
pub fn status(message: &str) {
    println!("{}", message.yellow());
}

pub fn error(message: &str) {
    eprintln!("{}", message.red());
}

/// Prints every snapshot published on `snapshots` until the sender is gone
pub async fn run(mut snapshots: watch::Receiver<Option<Arc<Snapshot>>>) {
    while snapshots.changed().await.is_ok() {
        let latest = snapshots.borrow_and_update().clone();
        if let Some(snapshot) = latest {
            println!("{}", "-".repeat(60).dimmed());
            print!("{}", render(&snapshot));
        }
    }
}
