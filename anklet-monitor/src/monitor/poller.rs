//! Status poller
//!
//! Refreshes a [`Snapshot`] every poll interval while monitoring is running
//! and publishes it through a `watch` channel. Each refresh replaces the
//! previous snapshot as a whole.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::failures;
use super::source::StatusSource;

/// Result of one refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Workload overview, or the error text that replaced it
    pub overview: String,
    /// Failure lines of the detailed state, or the placeholder
    pub failures: String,
    pub refreshed_at: DateTime<Local>,
}

/// Queries both status texts once and builds a snapshot
///
/// Query failures never propagate: they are substituted with an error line.
pub async fn refresh<S: StatusSource + ?Sized>(source: &S) -> Snapshot {
    let overview = source.overview().await.unwrap_or_else(|e| {
        warn!("Failed to get workloads: {:#}", e);
        format!("Error getting workloads: {:#}", e)
    });

    let detailed = source.detailed_state().await.unwrap_or_else(|e| {
        warn!("Failed to get state: {:#}", e);
        format!("Error getting state: {:#}", e)
    });

    Snapshot {
        overview,
        failures: failures::failures_text(&detailed),
        refreshed_at: Local::now(),
    }
}

/// Periodic status monitor
pub struct Monitor<S: StatusSource> {
    source: Arc<S>,
    interval: Duration,
    snapshots: Arc<watch::Sender<Option<Arc<Snapshot>>>>,
    running: Mutex<Option<CancellationToken>>,
}

impl<S: StatusSource> Monitor<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        let (snapshots, _) = watch::channel(None);
        Self {
            source: Arc::new(source),
            interval,
            snapshots: Arc::new(snapshots),
            running: Mutex::new(None),
        }
    }

    /// Receiver of every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshots.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.running().is_some()
    }

    /// Starts the background refresh task
    ///
    /// The first refresh happens immediately. Returns `false` if monitoring
    /// was already running.
    pub fn start(&self) -> bool {
        let mut running = self.running();
        if running.is_some() {
            return false;
        }

        let token = CancellationToken::new();
        *running = Some(token.clone());

        let source = Arc::clone(&self.source);
        let snapshots = Arc::clone(&self.snapshots);
        let interval = self.interval;

        tokio::spawn(async move {
            info!("Monitoring started (interval: {:?})", interval);

            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                debug!("Refreshing status");
                let snapshot = refresh(source.as_ref()).await;
                snapshots.send_replace(Some(Arc::new(snapshot)));
            }

            info!("Monitoring stopped");
        });

        true
    }

    /// Stops the background task
    ///
    /// A refresh already in flight completes, no further refresh starts.
    /// Returns `false` if monitoring was not running.
    pub fn stop(&self) -> bool {
        match self.running().take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Refreshes once, outside the periodic schedule, and publishes the result
    pub async fn refresh_now(&self) -> Arc<Snapshot> {
        let snapshot = Arc::new(refresh(self.source.as_ref()).await);
        self.snapshots.send_replace(Some(Arc::clone(&snapshot)));
        snapshot
    }

    fn running(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<S: StatusSource> Drop for Monitor<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
