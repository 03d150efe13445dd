use chrono::Duration;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;

/// Format an elapsed duration as spent-time text.
///
/// Whole hours and the remaining whole minutes are floored, never rounded.
///
/// * `< 1h` → `"45m"`
/// * `≥ 1h` → `"1h 30m"` (a zero remainder still prints as `"2h 0m"`)
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use motorway_core::formatting::format_duration;
///
/// assert_eq!(format_duration(Duration::minutes(90)), "1h 30m");
/// assert_eq!(format_duration(Duration::minutes(45)), "45m");
/// assert_eq!(format_duration(Duration::seconds(59)), "0m");
/// assert_eq!(format_duration(Duration::hours(2)), "2h 0m");
/// ```
pub fn format_duration(duration: Duration) -> String {
    format_millis(duration.num_milliseconds())
}

/// [`format_duration`] over a raw millisecond count.
///
/// Negative input is floored like positive input rather than clamped;
/// callers decide what a negative elapsed time means.
pub fn format_millis(ms: i64) -> String {
    let hours = ms.div_euclid(MS_PER_HOUR);
    let minutes = (ms % MS_PER_HOUR).div_euclid(MS_PER_MINUTE);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Chart label for an hour-of-day bucket, e.g. `7` → `"07:00"`.
pub fn hour_label(hour: u32) -> String {
    format!("{:02}:00", hour)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
