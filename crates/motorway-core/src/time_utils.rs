use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{MotorwayError, Result};

/// `chrono` pattern equivalent of the feed's `DD/MM/YYYY HH:MM` layout.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M";

// ── Feed timestamps ───────────────────────────────────────────────────────────

/// Parse a feed timestamp of the form `DD/MM/YYYY HH:MM`.
///
/// The text is split on a single space into a date and a time part, the date
/// on `/` into day, month and year and the time on `:` into hour and minute.
/// Every component must be a plain run of ASCII digits.
///
/// Calendar and clock ranges are enforced: `31/02/2025 10:00` and
/// `16/07/2025 24:00` are rejected instead of rolling over.
///
/// # Examples
///
/// ```
/// use chrono::{Datelike, Timelike};
/// use motorway_core::time_utils::parse_timestamp;
///
/// let ts = parse_timestamp("16/07/2025 10:53").unwrap();
/// assert_eq!((ts.day(), ts.month(), ts.year()), (16, 7, 2025));
/// assert_eq!((ts.hour(), ts.minute()), (10, 53));
///
/// assert!(parse_timestamp("2025-07-16 10:53").is_err());
/// ```
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let mut parts = text.split(' ');
    let (Some(date_part), Some(time_part), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(MotorwayError::timestamp(
            text,
            "expected a date and a time separated by one space",
        ));
    };

    let date_fields: Vec<&str> = date_part.split('/').collect();
    let [day, month, year] = date_fields.as_slice() else {
        return Err(MotorwayError::timestamp(text, "expected DD/MM/YYYY"));
    };

    let time_fields: Vec<&str> = time_part.split(':').collect();
    let [hour, minute] = time_fields.as_slice() else {
        return Err(MotorwayError::timestamp(text, "expected HH:MM"));
    };

    let day = parse_component(text, "day", day)?;
    let month = parse_component(text, "month", month)?;
    let year = parse_component(text, "year", year)?;
    let hour = parse_component(text, "hour", hour)?;
    let minute = parse_component(text, "minute", minute)?;

    let year = i32::try_from(year)
        .map_err(|_| MotorwayError::timestamp(text, "year out of range"))?;
    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| MotorwayError::timestamp(text, "no such calendar date"))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| MotorwayError::timestamp(text, "hour or minute out of range"))?;

    Ok(NaiveDateTime::new(date, time))
}

/// Render a timestamp back into the feed's `DD/MM/YYYY HH:MM` layout.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse one numeric component, rejecting signs, blanks and stray characters.
fn parse_component(input: &str, name: &str, raw: &str) -> Result<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MotorwayError::timestamp(
            input,
            format!("{name} \"{raw}\" is not a number"),
        ));
    }
    raw.parse::<u32>()
        .map_err(|_| MotorwayError::timestamp(input, format!("{name} \"{raw}\" is too large")))
}

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── LocalClock ────────────────────────────────────────────────────────────────

/// Wall clock for the site the feed was recorded at.
///
/// Feed timestamps carry no zone, so "now" has to be read in the same local
/// frame before it is compared with them. The engine itself never calls
/// [`LocalClock::now`]; callers do and pass the result down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalClock {
    tz: Tz,
}

impl LocalClock {
    /// Build a clock for the IANA zone `tz_name`.
    ///
    /// `"auto"` resolves to the system timezone. Unknown names fall back to
    /// UTC with a warning.
    pub fn new(tz_name: &str) -> Self {
        let resolved = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };

        let tz = resolved.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "LocalClock: unrecognised timezone \"{}\", falling back to UTC",
                resolved
            );
            Tz::UTC
        });
        Self { tz }
    }

    /// A clock fixed to UTC.
    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    /// Current local wall-clock time.
    pub fn now(&self) -> NaiveDateTime {
        self.at(Utc::now())
    }

    /// Local wall-clock reading of an absolute instant.
    pub fn at(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.tz).naive_local()
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Validate that `tz_name` is a recognised IANA timezone identifier.
    pub fn validate_timezone(tz_name: &str) -> bool {
        tz_name.parse::<Tz>().is_ok()
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::utc()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
