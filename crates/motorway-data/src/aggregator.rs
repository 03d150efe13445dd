//! Fleet-wide statistics over a record snapshot.
//!
//! Every figure is recomputed from scratch on each call; nothing is carried
//! between snapshots.

use chrono::{Datelike, NaiveDateTime, Timelike};
use motorway_core::formatting::{format_millis, hour_label};
use motorway_core::models::{ExitTime, VehicleRecord};
use serde::Serialize;

const MS_PER_MINUTE: i64 = 60 * 1000;

/// Day names indexed by [`WeekdayCount::day`] (0 = Sunday).
pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Half-open dwell-time ranges in minutes; `None` means unbounded.
const BUCKET_RANGES: [(&str, u32, Option<u32>); 6] = [
    ("0-30min", 0, Some(30)),
    ("30-60min", 30, Some(60)),
    ("1-2h", 60, Some(120)),
    ("2-4h", 120, Some(240)),
    ("4-6h", 240, Some(360)),
    ("6h+", 360, None),
];

// ── Distribution rows ─────────────────────────────────────────────────────────

/// Entries and exits falling in one hour of the day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    pub hour: u32,
    /// `"HH:00"`.
    pub label: String,
    pub entries: usize,
    pub exits: usize,
}

/// Entries and exits falling on one day of the week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdayCount {
    /// 0 = Sunday … 6 = Saturday.
    pub day: u32,
    pub name: &'static str,
    pub entries: usize,
    pub exits: usize,
    /// Mean journey length in whole minutes of vehicles that exited that day.
    pub avg_spent_minutes: i64,
    #[serde(skip)]
    journey_ms: i128,
    #[serde(skip)]
    journeys: usize,
}

impl WeekdayCount {
    fn new(day: u32) -> Self {
        Self {
            day,
            name: DAY_NAMES[day as usize],
            entries: 0,
            exits: 0,
            avg_spent_minutes: 0,
            journey_ms: 0,
            journeys: 0,
        }
    }

    fn finish(&mut self) {
        if self.journeys > 0 {
            let mean_ms = self.journey_ms as f64 / self.journeys as f64;
            self.avg_spent_minutes = (mean_ms / MS_PER_MINUTE as f64).round() as i64;
        }
    }
}

/// Number of vehicles whose elapsed time falls in one dwell-time range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationBucket {
    pub label: &'static str,
    pub min_minutes: u32,
    /// Exclusive upper bound; `None` for the open-ended last bucket.
    pub max_minutes: Option<u32>,
    pub count: usize,
}

impl DurationBucket {
    fn contains(&self, elapsed_ms: i64) -> bool {
        let lower = i64::from(self.min_minutes) * MS_PER_MINUTE;
        let below_upper = self
            .max_minutes
            .map(|max| elapsed_ms < i64::from(max) * MS_PER_MINUTE)
            .unwrap_or(true);
        elapsed_ms >= lower && below_upper
    }
}

// ── AggregateStats ────────────────────────────────────────────────────────────

/// Snapshot of occupancy and timing statistics for a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateStats {
    /// Vehicles without a usable exit time.
    pub current_on_motorway: usize,
    pub total_entries: usize,
    pub total_exits: usize,
    /// Mean journey length of exited vehicles, e.g. `"1h 12m"`.
    pub average_spent_time: String,
    pub average_spent_minutes: f64,
    /// Highest number of entries seen in a single hour of the day.
    pub peak_hour_entries: usize,
    /// Earliest hour reaching `peak_hour_entries`; `None` without entries.
    pub peak_hour: Option<u32>,
    /// 24 rows, hour 0 first.
    pub hourly: Vec<HourlyCount>,
    /// 7 rows, Sunday first.
    pub weekly: Vec<WeekdayCount>,
    pub duration_buckets: Vec<DurationBucket>,
    /// Records whose entry lies after their exit or the reference time.
    pub clock_skew_records: usize,
    pub unparseable_entries: usize,
    pub unparseable_exits: usize,
}

/// Compute statistics for `records` with `now` as the reference time for
/// vehicles still on the motorway.
///
/// An empty slice yields all-zero counts, `"0m"` average and no peak hour.
pub fn aggregate(records: &[VehicleRecord], now: NaiveDateTime) -> AggregateStats {
    let mut hourly: Vec<HourlyCount> = (0..24)
        .map(|hour| HourlyCount {
            hour,
            label: hour_label(hour),
            entries: 0,
            exits: 0,
        })
        .collect();
    let mut weekly: Vec<WeekdayCount> = (0..7).map(WeekdayCount::new).collect();
    let mut duration_buckets: Vec<DurationBucket> = BUCKET_RANGES
        .iter()
        .map(|&(label, min_minutes, max_minutes)| DurationBucket {
            label,
            min_minutes,
            max_minutes,
            count: 0,
        })
        .collect();

    let mut current_on_motorway = 0;
    let mut total_exits = 0;
    // Widened: spans near chrono's year limits overflow an i64 sum.
    let mut journey_ms_total: i128 = 0;
    let mut journeys = 0usize;
    let mut clock_skew_records = 0;
    let mut unparseable_entries = 0;
    let mut unparseable_exits = 0;

    for record in records {
        if record.is_open() {
            current_on_motorway += 1;
        } else {
            total_exits += 1;
        }
        if record.has_clock_skew(now) {
            clock_skew_records += 1;
        }
        if matches!(record.exit(), ExitTime::Unparseable) {
            unparseable_exits += 1;
        }

        match record.entry() {
            Some(entry) => {
                hourly[entry.hour() as usize].entries += 1;
                weekly[weekday_index(&entry)].entries += 1;
            }
            None => unparseable_entries += 1,
        }

        if let Some(exit) = record.exit().instant() {
            hourly[exit.hour() as usize].exits += 1;
            let day = &mut weekly[weekday_index(&exit)];
            day.exits += 1;
            if let Some(journey) = record.journey_duration() {
                let ms = i128::from(journey.num_milliseconds());
                day.journey_ms += ms;
                day.journeys += 1;
                journey_ms_total += ms;
                journeys += 1;
            }
        }

        if let Some(elapsed) = record.elapsed(now) {
            let ms = elapsed.num_milliseconds();
            if let Some(bucket) = duration_buckets.iter_mut().find(|b| b.contains(ms)) {
                bucket.count += 1;
            }
        }
    }

    weekly.iter_mut().for_each(WeekdayCount::finish);

    let (average_spent_time, average_spent_minutes) = if journeys > 0 {
        let mean_ms = journey_ms_total / journeys as i128;
        (
            format_millis(i64::try_from(mean_ms).unwrap_or(i64::MAX)),
            journey_ms_total as f64 / journeys as f64 / MS_PER_MINUTE as f64,
        )
    } else {
        (format_millis(0), 0.0)
    };

    let peak_hour_entries = hourly.iter().map(|h| h.entries).max().unwrap_or(0);
    let peak_hour = hourly
        .iter()
        .find(|h| peak_hour_entries > 0 && h.entries == peak_hour_entries)
        .map(|h| h.hour);

    AggregateStats {
        current_on_motorway,
        total_entries: records.len(),
        total_exits,
        average_spent_time,
        average_spent_minutes,
        peak_hour_entries,
        peak_hour,
        hourly,
        weekly,
        duration_buckets,
        clock_skew_records,
        unparseable_entries,
        unparseable_exits,
    }
}

fn weekday_index(ts: &NaiveDateTime) -> usize {
    ts.weekday().num_days_from_sunday() as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────
