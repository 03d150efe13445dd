//! JSON renderings for the `live` and `current` views.

use chrono::NaiveDateTime;
use motorway_core::models::VehicleRecord;
use motorway_core::time_utils::format_timestamp;
use motorway_data::live::current_vehicles;
use motorway_runtime::orchestrator::MonitoringSnapshot;
use serde::Serialize;

// ── current ───────────────────────────────────────────────────────────────────

/// One row of the current-vehicles export.
#[derive(Debug, Serialize)]
pub struct CurrentVehicle<'a> {
    pub plate: &'a str,
    pub entry_time: &'a str,
    pub spent_time: &'a str,
}

/// Vehicles still on the motorway at `reference_time`.
#[derive(Debug, Serialize)]
pub struct CurrentReport<'a> {
    pub reference_time: String,
    pub count: usize,
    pub vehicles: Vec<CurrentVehicle<'a>>,
}

/// Build the export for `records`, which must already be refreshed to `now`.
pub fn current_report(records: &[VehicleRecord], now: NaiveDateTime) -> CurrentReport<'_> {
    let vehicles: Vec<CurrentVehicle<'_>> = current_vehicles(records)
        .into_iter()
        .map(|r| CurrentVehicle {
            plate: r.plate(),
            entry_time: r.entry_text(),
            spent_time: r.spent_time(),
        })
        .collect();

    CurrentReport {
        reference_time: format_timestamp(&now),
        count: vehicles.len(),
        vehicles,
    }
}

// ── live ──────────────────────────────────────────────────────────────────────

/// Turns snapshots into log lines and one JSON line of stats each.
///
/// Feed errors are logged when they first appear and when they clear, not on
/// every tick.
#[derive(Debug, Default)]
pub struct LiveReporter {
    last_error: Option<String>,
}

impl LiveReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log a summary of `snapshot` and return its stats as compact JSON.
    pub fn report(&mut self, snapshot: &MonitoringSnapshot) -> serde_json::Result<String> {
        if snapshot.last_error != self.last_error {
            match &snapshot.last_error {
                Some(err) => tracing::warn!(error = %err, "feed unavailable; showing last good records"),
                None => tracing::info!("feed readable again"),
            }
            self.last_error = snapshot.last_error.clone();
        }

        let stats = &snapshot.stats;
        tracing::info!(
            reference = %format_timestamp(&snapshot.reference_time),
            on_motorway = stats.current_on_motorway,
            entries = stats.total_entries,
            exits = stats.total_exits,
            average = %stats.average_spent_time,
            "snapshot"
        );

        serde_json::to_string(stats)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use motorway_core::time_utils::parse_timestamp;
    use motorway_data::aggregator::aggregate;
    use motorway_data::reader::parse_feed;

    const FEED: &str = "plate,entry,exit\nABC-1,16/07/2025 10:53,16/07/2025 12:23\nXYZ-2,16/07/2025 09:00,\n";

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn snapshot(last_error: Option<&str>) -> MonitoringSnapshot {
        let now = ts("16/07/2025 09:45");
        let records = parse_feed(FEED, now);
        let stats = aggregate(&records, now);
        MonitoringSnapshot {
            records,
            stats,
            reference_time: now,
            last_error: last_error.map(str::to_string),
        }
    }

    #[test]
    fn test_current_report_lists_open_records() {
        let now = ts("16/07/2025 09:45");
        let records = parse_feed(FEED, now);
        let report = current_report(&records, now);

        assert_eq!(report.count, 1);
        assert_eq!(report.reference_time, "16/07/2025 09:45");
        assert_eq!(report.vehicles[0].plate, "XYZ-2");
        assert_eq!(report.vehicles[0].entry_time, "16/07/2025 09:00");
        assert_eq!(report.vehicles[0].spent_time, "45m");
    }

    #[test]
    fn test_current_report_json_shape() {
        let now = ts("16/07/2025 09:45");
        let records = parse_feed(FEED, now);
        let value = serde_json::to_value(current_report(&records, now)).unwrap();

        assert_eq!(value["count"], 1);
        assert_eq!(value["vehicles"][0]["plate"], "XYZ-2");
        assert!(value["vehicles"][0].get("exit_time").is_none());
    }

    #[test]
    fn test_current_report_empty() {
        let report = current_report(&[], ts("16/07/2025 09:45"));
        assert_eq!(report.count, 0);
        assert!(report.vehicles.is_empty());
    }

    #[test]
    fn test_live_reporter_emits_stats_line() {
        let mut reporter = LiveReporter::new();
        let line = reporter.report(&snapshot(None)).unwrap();

        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["current_on_motorway"], 1);
        assert_eq!(value["total_entries"], 2);
    }

    #[test]
    fn test_live_reporter_tracks_error_transitions() {
        let mut reporter = LiveReporter::new();
        reporter.report(&snapshot(Some("Failed to read feed"))).unwrap();
        assert_eq!(reporter.last_error.as_deref(), Some("Failed to read feed"));

        reporter.report(&snapshot(None)).unwrap();
        assert!(reporter.last_error.is_none());
    }
}
