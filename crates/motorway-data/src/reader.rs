//! Vehicle log ingestion.
//!
//! The feed is a comma-separated file whose first line is a header and whose
//! remaining lines are `plate,entry,exit`. Parsing is best-effort: short lines
//! are skipped, bad timestamps degrade the record instead of dropping it.

use std::path::Path;

use chrono::NaiveDateTime;
use motorway_core::error::{MotorwayError, Result};
use motorway_core::models::VehicleRecord;
use tracing::{debug, warn};

/// Line-level outcome of one [`parse_feed_with_summary`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Data lines seen after the header, blank lines excluded.
    pub lines_read: usize,
    /// Lines dropped for having fewer than three fields.
    pub lines_skipped: usize,
    /// Records produced.
    pub records: usize,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse raw feed text into records, preserving line order.
pub fn parse_feed(raw: &str, now: NaiveDateTime) -> Vec<VehicleRecord> {
    parse_feed_with_summary(raw, now).0
}

/// [`parse_feed`] plus line counts for logging.
pub fn parse_feed_with_summary(
    raw: &str,
    now: NaiveDateTime,
) -> (Vec<VehicleRecord>, IngestSummary) {
    let mut records = Vec::new();
    let mut summary = IngestSummary::default();

    // Leading blank lines do not count as the header, which is never
    // inspected; column order is fixed.
    for (index, line) in raw.trim().split('\n').enumerate().skip(1) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }
        summary.lines_read += 1;

        let fields: Vec<String> = line.split(',').map(clean_field).collect();
        let [plate, entry, exit, ..] = fields.as_slice() else {
            debug!(line = index + 1, fields = fields.len(), "skipping short feed line");
            summary.lines_skipped += 1;
            continue;
        };

        records.push(VehicleRecord::normalize(
            plate.as_str(),
            entry.as_str(),
            exit.as_str(),
            now,
        ));
    }

    summary.records = records.len();
    (records, summary)
}

/// Read the raw feed text from disk.
pub fn read_feed(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => MotorwayError::FeedNotFound(path.to_path_buf()),
        _ => MotorwayError::FeedRead {
            path: path.to_path_buf(),
            source,
        },
    })
}

/// Read and parse the feed, reporting read failures to the caller.
pub fn try_load_feed(path: &Path, now: NaiveDateTime) -> Result<Vec<VehicleRecord>> {
    let raw = read_feed(path)?;
    let (records, summary) = parse_feed_with_summary(&raw, now);
    debug!(
        "Feed {}: {} lines read, {} skipped, {} records",
        path.display(),
        summary.lines_read,
        summary.lines_skipped,
        summary.records,
    );
    Ok(records)
}

/// Read and parse the feed; an unreadable source yields no records.
pub fn load_feed(path: &Path, now: NaiveDateTime) -> Vec<VehicleRecord> {
    match try_load_feed(path, now) {
        Ok(records) => records,
        Err(e) => {
            warn!("{}", e);
            Vec::new()
        }
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Trim surrounding whitespace and drop every double quote.
fn clean_field(raw: &str) -> String {
    raw.trim().replace('"', "")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use motorway_core::models::VehicleStatus;
    use motorway_core::time_utils::parse_timestamp;
    use std::io::Write;
    use tempfile::TempDir;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn write_feed(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    // ── parse_feed ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_feed_two_records() {
        let raw = "plate,entry,exit\nABC-1,16/07/2025 10:53,16/07/2025 12:23\nXYZ-2,16/07/2025 09:00,";
        let records = parse_feed(raw, ts("16/07/2025 09:30"));

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].plate(), "ABC-1");
        assert_eq!(records[0].status(), VehicleStatus::Exited);
        assert_eq!(records[0].spent_time(), "1h 30m");
        assert_eq!(records[1].plate(), "XYZ-2");
        assert_eq!(records[1].status(), VehicleStatus::OnMotorway);
        assert_eq!(records[1].exit_text(), "");
    }

    #[test]
    fn test_parse_feed_skips_short_lines() {
        let raw = "plate,entry,exit\nBAD-1,16/07/2025 10:00\nOK-1,16/07/2025 10:00,16/07/2025 10:30\n";
        let (records, summary) = parse_feed_with_summary(raw, ts("16/07/2025 11:00"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plate(), "OK-1");
        assert_eq!(
            summary,
            IngestSummary {
                lines_read: 2,
                lines_skipped: 1,
                records: 1,
            }
        );
    }

    #[test]
    fn test_parse_feed_header_never_becomes_a_record() {
        // Header that looks like data is still discarded.
        let raw = "HDR-0,16/07/2025 08:00,\nABC-1,16/07/2025 09:00,";
        let records = parse_feed(raw, ts("16/07/2025 10:00"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plate(), "ABC-1");
    }

    #[test]
    fn test_parse_feed_strips_quotes_and_whitespace() {
        let raw = "\"plate\",\"entry\",\"exit\"\n \"ABC-1\" , \"16/07/2025 10:00\" ,\"\"\n";
        let records = parse_feed(raw, ts("16/07/2025 10:15"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].plate(), "ABC-1");
        assert_eq!(records[0].entry_text(), "16/07/2025 10:00");
        assert_eq!(records[0].status(), VehicleStatus::OnMotorway);
        assert_eq!(records[0].spent_time(), "15m");
    }

    #[test]
    fn test_parse_feed_handles_crlf_and_blank_lines() {
        let raw = "plate,entry,exit\r\n\r\nABC-1,16/07/2025 10:00,16/07/2025 11:00\r\n\r\n";
        let records = parse_feed(raw, ts("16/07/2025 12:00"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exit_text(), "16/07/2025 11:00");
        assert_eq!(records[0].status(), VehicleStatus::Exited);
    }

    #[test]
    fn test_parse_feed_preserves_order_and_duplicates() {
        let raw = "plate,entry,exit\n\
                   CCC-3,17/07/2025 08:00,\n\
                   AAA-1,15/07/2025 08:00,15/07/2025 09:00\n\
                   CCC-3,16/07/2025 08:00,16/07/2025 08:10\n";
        let records = parse_feed(raw, ts("17/07/2025 09:00"));
        let plates: Vec<&str> = records.iter().map(|r| r.plate()).collect();
        assert_eq!(plates, vec!["CCC-3", "AAA-1", "CCC-3"]);
    }

    #[test]
    fn test_parse_feed_extra_fields_ignored() {
        let raw = "plate,entry,exit,lane\nABC-1,16/07/2025 10:00,16/07/2025 10:20,3\n";
        let records = parse_feed(raw, ts("16/07/2025 11:00"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].spent_time(), "20m");
    }

    #[test]
    fn test_parse_feed_bad_timestamp_degrades_record() {
        let raw = "plate,entry,exit\nABC-1,not a time,\n";
        let records = parse_feed(raw, ts("16/07/2025 11:00"));
        assert_eq!(records.len(), 1);
        assert!(records[0].entry().is_none());
        assert_eq!(records[0].spent_time(), "");
    }

    #[test]
    fn test_parse_feed_empty_and_header_only() {
        let now = ts("16/07/2025 11:00");
        assert!(parse_feed("", now).is_empty());
        assert!(parse_feed("plate,entry,exit", now).is_empty());
        assert!(parse_feed("plate,entry,exit\n\n\n", now).is_empty());
    }

    // ── load_feed ─────────────────────────────────────────────────────────────

    #[test]
    fn test_load_feed_from_file() {
        let dir = TempDir::new().unwrap();
        let path = write_feed(
            dir.path(),
            "vehicle_log.csv",
            "plate,entry,exit\nABC-1,16/07/2025 10:00,\n",
        );
        let records = load_feed(&path, ts("16/07/2025 10:05"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].spent_time(), "5m");
    }

    #[test]
    fn test_load_feed_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = load_feed(&dir.path().join("absent.csv"), ts("16/07/2025 10:05"));
        assert!(records.is_empty());
    }

    #[test]
    fn test_try_load_feed_reports_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.csv");
        match try_load_feed(&path, ts("16/07/2025 10:05")) {
            Err(MotorwayError::FeedNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_read_feed_directory_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_feed(dir.path()),
            Err(MotorwayError::FeedRead { .. })
        ));
    }

    #[test]
    fn test_clean_field() {
        assert_eq!(clean_field("  \"ABC-1\"  "), "ABC-1");
        assert_eq!(clean_field("\"\""), "");
        assert_eq!(clean_field("a\"b"), "ab");
    }
}
