use chrono::{Duration, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, warn};

use crate::formatting::format_duration;
use crate::time_utils::{format_timestamp, parse_timestamp};

/// Whether a vehicle is still travelling on the motorway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleStatus {
    /// No usable exit time yet.
    OnMotorway,
    /// A valid exit time was recorded.
    Exited,
}

/// Parsed state of a record's exit column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTime {
    /// The exit column was empty, or the entry column was unusable so the
    /// exit was never resolved.
    Open,
    /// The vehicle left at this local time.
    Exited(NaiveDateTime),
    /// The exit column held text that is not a valid timestamp.
    Unparseable,
}

impl ExitTime {
    /// The resolved exit instant, if any.
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Exited(ts) => Some(*ts),
            Self::Open | Self::Unparseable => None,
        }
    }
}

/// One observed motorway traversal.
///
/// Fields are private so that `status` can only ever be derived from the exit
/// column and `spent_time` only changes through [`VehicleRecord::refreshed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    plate: String,
    entry_text: String,
    exit_text: String,
    entry: Option<NaiveDateTime>,
    exit: ExitTime,
    spent_time: String,
}

impl VehicleRecord {
    /// Build a record from one raw `(plate, entry, exit)` triple.
    ///
    /// `now` is the reference time used for the spent time of open records.
    pub fn normalize(
        plate: impl Into<String>,
        entry_text: impl Into<String>,
        exit_text: impl Into<String>,
        now: NaiveDateTime,
    ) -> Self {
        let plate = plate.into();
        let entry_text = entry_text.into();
        let exit_text = exit_text.into();

        let entry = match parse_timestamp(&entry_text) {
            Ok(ts) => Some(ts),
            Err(e) => {
                debug!(plate = %plate, error = %e, "entry time unusable");
                None
            }
        };

        // Without an entry time the record can not count as exited.
        let exit = if entry.is_none() || exit_text.trim().is_empty() {
            ExitTime::Open
        } else {
            match parse_timestamp(&exit_text) {
                Ok(ts) => ExitTime::Exited(ts),
                Err(e) => {
                    debug!(plate = %plate, error = %e, "exit time unusable; treating as open");
                    ExitTime::Unparseable
                }
            }
        };

        let mut record = Self {
            plate,
            entry_text,
            exit_text,
            entry,
            exit,
            spent_time: String::new(),
        };

        if record.has_clock_skew(now) {
            warn!(
                plate = %record.plate,
                entry = %record.entry_text,
                "entry is later than the exit or reference time; clamping spent time to zero"
            );
        }
        record.spent_time = record.compute_spent_time(now);
        record
    }

    pub fn plate(&self) -> &str {
        &self.plate
    }

    /// Entry timestamp exactly as it appeared in the feed.
    pub fn entry_text(&self) -> &str {
        &self.entry_text
    }

    /// Exit timestamp exactly as it appeared in the feed (may be empty).
    pub fn exit_text(&self) -> &str {
        &self.exit_text
    }

    /// Parsed entry time; `None` when the entry column failed to parse.
    pub fn entry(&self) -> Option<NaiveDateTime> {
        self.entry
    }

    pub fn exit(&self) -> ExitTime {
        self.exit
    }

    /// Human-readable elapsed time, e.g. `"1h 30m"`. Empty without an entry time.
    pub fn spent_time(&self) -> &str {
        &self.spent_time
    }

    /// `Exited` iff the exit column resolved to a timestamp.
    pub fn status(&self) -> VehicleStatus {
        match self.exit {
            ExitTime::Exited(_) => VehicleStatus::Exited,
            ExitTime::Open | ExitTime::Unparseable => VehicleStatus::OnMotorway,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status() == VehicleStatus::OnMotorway
    }

    /// The point the elapsed time runs to: the exit time, else `now`.
    pub fn endpoint(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.exit.instant().unwrap_or(now)
    }

    /// Elapsed time from entry to [`endpoint`](Self::endpoint), clamped at zero.
    ///
    /// `None` when the entry time is unknown.
    pub fn elapsed(&self, now: NaiveDateTime) -> Option<Duration> {
        let entry = self.entry?;
        Some((self.endpoint(now) - entry).max(Duration::zero()))
    }

    /// Time between entry and exit for exited records, clamped at zero.
    pub fn journey_duration(&self) -> Option<Duration> {
        let entry = self.entry?;
        let exit = self.exit.instant()?;
        Some((exit - entry).max(Duration::zero()))
    }

    /// `true` when the entry time lies after the exit time (or after `now`
    /// for open records). Such records report a zero elapsed time.
    pub fn has_clock_skew(&self, now: NaiveDateTime) -> bool {
        self.entry
            .map(|entry| entry > self.endpoint(now))
            .unwrap_or(false)
    }

    /// Return the record with its spent time recomputed against `now`.
    ///
    /// Exited records are returned unchanged; their spent time is fixed.
    pub fn refreshed(mut self, now: NaiveDateTime) -> Self {
        self.refresh(now);
        self
    }

    /// In-place form of [`refreshed`](Self::refreshed).
    pub fn refresh(&mut self, now: NaiveDateTime) {
        if self.is_open() {
            self.spent_time = self.compute_spent_time(now);
        }
    }

    fn compute_spent_time(&self, now: NaiveDateTime) -> String {
        self.elapsed(now).map(format_duration).unwrap_or_default()
    }
}

impl Serialize for VehicleRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VehicleRecord", 7)?;
        state.serialize_field("plate", &self.plate)?;
        state.serialize_field("entry_time", &self.entry_text)?;
        state.serialize_field("exit_time", &self.exit_text)?;
        state.serialize_field("entry_instant", &self.entry.as_ref().map(format_timestamp))?;
        state.serialize_field(
            "exit_instant",
            &self.exit.instant().as_ref().map(format_timestamp),
        )?;
        state.serialize_field("status", &self.status())?;
        state.serialize_field("spent_time", &self.spent_time)?;
        state.end()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    #[test]
    fn test_exited_record() {
        let now = ts("16/07/2025 18:00");
        let r = VehicleRecord::normalize("ABC-1", "16/07/2025 10:53", "16/07/2025 12:23", now);
        assert_eq!(r.status(), VehicleStatus::Exited);
        assert_eq!(r.spent_time(), "1h 30m");
        assert_eq!(r.exit().instant(), Some(ts("16/07/2025 12:23")));
        assert_eq!(r.journey_duration(), Some(Duration::minutes(90)));
    }

    #[test]
    fn test_open_record_uses_now() {
        let now = ts("16/07/2025 09:45");
        let r = VehicleRecord::normalize("XYZ-2", "16/07/2025 09:00", "", now);
        assert_eq!(r.status(), VehicleStatus::OnMotorway);
        assert_eq!(r.exit(), ExitTime::Open);
        assert_eq!(r.spent_time(), "45m");
        assert!(r.journey_duration().is_none());
    }

    #[test]
    fn test_bad_entry_keeps_record() {
        let now = ts("16/07/2025 09:45");
        let r = VehicleRecord::normalize("BAD-1", "yesterday", "16/07/2025 10:00", now);
        assert!(r.entry().is_none());
        assert_eq!(r.entry_text(), "yesterday");
        assert_eq!(r.spent_time(), "");
        assert!(r.elapsed(now).is_none());
    }

    #[test]
    fn test_bad_entry_with_valid_exit_is_open() {
        let now = ts("16/07/2025 09:45");
        let r = VehicleRecord::normalize("BAD-1", "yesterday", "16/07/2025 10:00", now);
        assert_eq!(r.status(), VehicleStatus::OnMotorway);
        assert!(r.is_open());
        assert_eq!(r.exit(), ExitTime::Open);
        assert_eq!(r.exit_text(), "16/07/2025 10:00");
        assert!(r.journey_duration().is_none());

        let value = serde_json::to_value(&r).unwrap();
        assert!(value["exit_instant"].is_null());
        assert_eq!(value["status"], "on-motorway");
    }

    #[test]
    fn test_bad_entry_without_exit_is_open() {
        let now = ts("16/07/2025 09:45");
        let r = VehicleRecord::normalize("BAD-2", "??", "", now);
        assert_eq!(r.status(), VehicleStatus::OnMotorway);
        assert_eq!(r.spent_time(), "");
    }

    #[test]
    fn test_unparseable_exit_is_open() {
        let now = ts("16/07/2025 11:00");
        let r = VehicleRecord::normalize("ODD-1", "16/07/2025 10:00", "soon", now);
        assert_eq!(r.exit(), ExitTime::Unparseable);
        assert_eq!(r.status(), VehicleStatus::OnMotorway);
        assert_eq!(r.exit_text(), "soon");
        // Still live: measured against `now`.
        assert_eq!(r.spent_time(), "1h 0m");
    }

    #[test]
    fn test_exit_before_entry_clamps_to_zero() {
        let now = ts("16/07/2025 18:00");
        let r = VehicleRecord::normalize("SKW-1", "16/07/2025 12:00", "16/07/2025 11:00", now);
        assert_eq!(r.status(), VehicleStatus::Exited);
        assert!(r.has_clock_skew(now));
        assert_eq!(r.spent_time(), "0m");
        assert_eq!(r.journey_duration(), Some(Duration::zero()));
    }

    #[test]
    fn test_future_entry_clamps_to_zero() {
        let now = ts("16/07/2025 08:00");
        let r = VehicleRecord::normalize("FUT-1", "16/07/2025 09:00", "", now);
        assert!(r.has_clock_skew(now));
        assert_eq!(r.spent_time(), "0m");
        assert!(!r.has_clock_skew(ts("16/07/2025 10:00")));
    }

    #[test]
    fn test_refresh_updates_open_record_only() {
        let start = ts("16/07/2025 09:00");
        let open = VehicleRecord::normalize("OPN-1", "16/07/2025 09:00", "", start);
        let closed =
            VehicleRecord::normalize("CLS-1", "16/07/2025 08:00", "16/07/2025 08:20", start);

        let later = ts("16/07/2025 11:05");
        let open = open.refreshed(later);
        let closed_after = closed.clone().refreshed(later);

        assert_eq!(open.spent_time(), "2h 5m");
        assert_eq!(closed_after, closed);
        assert_eq!(closed_after.spent_time(), "20m");
    }

    #[test]
    fn test_refresh_is_idempotent() {
        let now = ts("16/07/2025 10:30");
        let r = VehicleRecord::normalize("IDM-1", "16/07/2025 09:00", "", now);
        let once = r.clone().refreshed(now);
        let twice = once.clone().refreshed(now);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_serialize_shape() {
        let now = ts("16/07/2025 18:00");
        let r = VehicleRecord::normalize("ABC-1", "16/07/2025 10:53", "", now);
        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["plate"], "ABC-1");
        assert_eq!(value["entry_time"], "16/07/2025 10:53");
        assert_eq!(value["exit_time"], "");
        assert_eq!(value["entry_instant"], "16/07/2025 10:53");
        assert!(value["exit_instant"].is_null());
        assert_eq!(value["status"], "on-motorway");
        assert_eq!(value["spent_time"], "7h 7m");
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&VehicleStatus::Exited).unwrap(),
            "\"exited\""
        );
        assert_eq!(
            serde_json::to_string(&VehicleStatus::OnMotorway).unwrap(),
            "\"on-motorway\""
        );
    }
}
