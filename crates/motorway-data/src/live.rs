//! Live spent-time updates for vehicles still on the motorway.
//!
//! The caller owns the tick; every call here is a full, independent
//! recomputation against the `now` it is given.

use chrono::NaiveDateTime;
use motorway_core::models::VehicleRecord;

/// Return a new sequence with every open record's spent time recomputed.
///
/// Exited records pass through unchanged. Idempotent for a fixed `now`.
pub fn refresh(records: &[VehicleRecord], now: NaiveDateTime) -> Vec<VehicleRecord> {
    records
        .iter()
        .cloned()
        .map(|record| record.refreshed(now))
        .collect()
}

/// In-place form of [`refresh`] for a collection the caller already holds.
pub fn refresh_in_place(records: &mut [VehicleRecord], now: NaiveDateTime) {
    for record in records.iter_mut() {
        record.refresh(now);
    }
}

/// Records still on the motorway, in feed order.
pub fn current_vehicles(records: &[VehicleRecord]) -> Vec<&VehicleRecord> {
    records.iter().filter(|r| r.is_open()).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_feed;
    use motorway_core::time_utils::parse_timestamp;

    const FEED: &str = "plate,entry,exit\n\
                        ABC-1,16/07/2025 10:53,16/07/2025 12:23\n\
                        XYZ-2,16/07/2025 09:00,\n";

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_refresh_recomputes_open_records() {
        let records = parse_feed(FEED, ts("16/07/2025 09:10"));
        assert_eq!(records[1].spent_time(), "10m");

        let refreshed = refresh(&records, ts("16/07/2025 09:45"));

        assert_eq!(refreshed[0].spent_time(), "1h 30m");
        assert_eq!(refreshed[1].spent_time(), "45m");
        // The input snapshot is left alone.
        assert_eq!(records[1].spent_time(), "10m");
    }

    #[test]
    fn test_refresh_leaves_exited_records_untouched() {
        let records = parse_feed(FEED, ts("16/07/2025 13:00"));
        let refreshed = refresh(&records, ts("20/07/2025 13:00"));
        assert_eq!(refreshed[0], records[0]);
    }

    #[test]
    fn test_refresh_idempotent() {
        let records = parse_feed(FEED, ts("16/07/2025 09:10"));
        let now = ts("16/07/2025 11:02");
        let once = refresh(&records, now);
        let twice = refresh(&once, now);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_refresh_in_place_matches_refresh() {
        let records = parse_feed(FEED, ts("16/07/2025 09:10"));
        let now = ts("16/07/2025 14:59");

        let mut held = records.clone();
        refresh_in_place(&mut held, now);

        assert_eq!(held, refresh(&records, now));
        assert_eq!(held[1].spent_time(), "5h 59m");
    }

    #[test]
    fn test_refresh_keeps_unparseable_entry_empty() {
        let raw = "plate,entry,exit\nBAD-1,bogus,\n";
        let records = parse_feed(raw, ts("16/07/2025 09:10"));
        let refreshed = refresh(&records, ts("16/07/2025 10:10"));
        assert_eq!(refreshed[0].spent_time(), "");
    }

    #[test]
    fn test_refresh_empty() {
        assert!(refresh(&[], ts("16/07/2025 10:10")).is_empty());
    }

    #[test]
    fn test_current_vehicles_filters_open() {
        let records = parse_feed(FEED, ts("16/07/2025 13:00"));
        let current = current_vehicles(&records);
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].plate(), "XYZ-2");
    }
}
