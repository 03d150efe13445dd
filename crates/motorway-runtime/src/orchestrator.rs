//! Async monitoring orchestrator.
//!
//! Drives a [`DataManager`] from a tokio task: the feed is re-ingested every
//! `reload_interval`, while spent times and aggregates are recomputed on every
//! `tick_interval` against a fresh reference time. Each tick produces a
//! [`MonitoringSnapshot`] sent through an `mpsc` channel.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDateTime;
use motorway_core::models::VehicleRecord;
use motorway_core::time_utils::LocalClock;
use motorway_data::aggregator::{aggregate, AggregateStats};
use motorway_data::live::refresh_in_place;
use tokio::sync::mpsc;
use tokio::time;

use crate::data_manager::DataManager;

/// Default seconds between spent-time refreshes.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 1;

// ── Public types ──────────────────────────────────────────────────────────────

/// The state of the feed at one tick.
#[derive(Debug, Clone)]
pub struct MonitoringSnapshot {
    /// All records with spent times refreshed against `reference_time`.
    pub records: Vec<VehicleRecord>,
    pub stats: AggregateStats,
    /// Local time the snapshot was computed for.
    pub reference_time: NaiveDateTime,
    /// Most recent reload failure; `records` are then the last good copy.
    pub last_error: Option<String>,
}

impl MonitoringSnapshot {
    /// Records still on the motorway.
    pub fn current_vehicles(&self) -> Vec<&VehicleRecord> {
        motorway_data::live::current_vehicles(&self.records)
    }
}

// ── MonitoringOrchestrator ────────────────────────────────────────────────────

/// Background monitoring coordinator.
///
/// Call [`MonitoringOrchestrator::start`] to spin up the loop and receive the
/// snapshot channel.
pub struct MonitoringOrchestrator {
    tick_interval: Duration,
    /// Feed reload cadence; used as the data manager's cache TTL.
    reload_interval: Duration,
    feed_path: PathBuf,
    clock: LocalClock,
}

impl MonitoringOrchestrator {
    /// Create a new orchestrator.
    ///
    /// # Parameters
    /// - `tick_interval_secs`   – seconds between spent-time refreshes (min 1).
    /// - `reload_interval_secs` – seconds between feed reloads.
    /// - `feed_path`            – CSV feed to ingest.
    /// - `clock`                – source of the local reference time.
    pub fn new(
        tick_interval_secs: u64,
        reload_interval_secs: u64,
        feed_path: PathBuf,
        clock: LocalClock,
    ) -> Self {
        Self {
            tick_interval: Duration::from_secs(tick_interval_secs.max(1)),
            reload_interval: Duration::from_secs(reload_interval_secs),
            feed_path,
            clock,
        }
    }

    /// Start the monitoring loop.
    ///
    /// Returns the snapshot receiver and a [`MonitoringHandle`] that aborts
    /// the loop. The loop also ends on its own once the receiver is dropped.
    pub fn start(self) -> (mpsc::Receiver<MonitoringSnapshot>, MonitoringHandle) {
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            self.monitoring_loop(tx).await;
        });

        (rx, MonitoringHandle { handle })
    }

    // ── Private implementation ────────────────────────────────────────────

    async fn monitoring_loop(self, tx: mpsc::Sender<MonitoringSnapshot>) {
        let data_manager =
            DataManager::new(self.reload_interval.as_secs(), self.feed_path.clone());

        let Some(mut data_manager) = self.tick(data_manager, &tx, true).await else {
            return;
        };

        let mut interval = time::interval(self.tick_interval);
        // First tick fires immediately; the initial snapshot is already out.
        interval.tick().await;

        loop {
            interval.tick().await;

            if tx.is_closed() {
                tracing::debug!("monitoring channel closed; exiting loop");
                break;
            }

            match self.tick(data_manager, &tx, false).await {
                Some(dm) => data_manager = dm,
                None => break,
            }
        }
    }

    /// Build and send one snapshot, handing the manager back for the next
    /// tick. Returns `None` once the receiver is gone.
    ///
    /// Feed reads and retry back-off block, so they run on the blocking pool.
    async fn tick(
        &self,
        mut data_manager: DataManager,
        tx: &mpsc::Sender<MonitoringSnapshot>,
        force: bool,
    ) -> Option<DataManager> {
        let now = self.clock.now();
        let built = tokio::task::spawn_blocking(move || {
            let snapshot = build_snapshot(&mut data_manager, now, force);
            (data_manager, snapshot)
        })
        .await;

        let (data_manager, snapshot) = match built {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!(error = %e, "snapshot task failed; stopping monitoring loop");
                return None;
            }
        };

        if let Err(e) = tx.send(snapshot).await {
            tracing::debug!(error = %e, "failed to send monitoring snapshot; receiver dropped");
            return None;
        }
        Some(data_manager)
    }
}

/// Refresh the manager's records against `now` and aggregate them.
///
/// With no records at all (first load failed) the snapshot is empty and
/// carries the load error.
fn build_snapshot(
    data_manager: &mut DataManager,
    now: NaiveDateTime,
    force: bool,
) -> MonitoringSnapshot {
    let mut records = data_manager
        .get_records(force, now)
        .map(<[VehicleRecord]>::to_vec)
        .unwrap_or_default();

    refresh_in_place(&mut records, now);
    let stats = aggregate(&records, now);

    MonitoringSnapshot {
        records,
        stats,
        reference_time: now,
        last_error: data_manager.last_error().map(str::to_string),
    }
}

// ── MonitoringHandle ──────────────────────────────────────────────────────────

/// A handle to the background monitoring task.
pub struct MonitoringHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl MonitoringHandle {
    /// Immediately abort the monitoring loop.
    pub fn abort(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
