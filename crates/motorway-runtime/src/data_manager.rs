//! TTL-cached feed manager.
//!
//! Wraps [`try_load_feed`] with a time-to-live cache and retry logic. On a
//! failed reload the previous records stay in place and the error is kept
//! for the caller to surface.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use motorway_core::error::MotorwayError;
use motorway_core::models::VehicleRecord;
use motorway_data::reader::try_load_feed;

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Maximum number of read attempts per reload.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached holder of the most recently ingested feed.
///
/// # Example
/// ```no_run
/// use motorway_core::time_utils::LocalClock;
/// use motorway_runtime::data_manager::DataManager;
///
/// let clock = LocalClock::new("auto");
/// let mut mgr = DataManager::new(30, "vehicle_log.csv".into());
/// if let Some(records) = mgr.get_records(false, clock.now()) {
///     println!("{} records", records.len());
/// }
/// ```
pub struct DataManager {
    /// Maximum age of cached records before the feed is read again.
    cache_ttl: Duration,
    feed_path: PathBuf,
    cache: Option<Vec<VehicleRecord>>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    last_error: Option<String>,
    /// When the last successful read completed; kept across failed reloads.
    last_successful_fetch: Option<Instant>,
}

impl DataManager {
    pub fn new(cache_ttl_secs: u64, feed_path: PathBuf) -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            feed_path,
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the feed records, re-reading the feed when the cache is stale.
    ///
    /// `now` is the reference time stamped into newly ingested records.
    /// When `force_refresh` is `true` the cache is bypassed. On failure the
    /// previous records (if any) are returned.
    pub fn get_records(
        &mut self,
        force_refresh: bool,
        now: NaiveDateTime,
    ) -> Option<&[VehicleRecord]> {
        if !force_refresh && self.is_cache_valid() {
            tracing::trace!("returning cached feed records");
            return self.cache.as_deref();
        }

        match self.fetch_with_retry(now) {
            Ok(records) => {
                tracing::debug!(records = records.len(), "feed cache updated");
                self.cache = Some(records);
                self.cache_timestamp = Some(Instant::now());
                self.last_successful_fetch = self.cache_timestamp;
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "feed reload failed; keeping previous records");
                self.last_error = Some(e.to_string());
                // Do not hammer a missing feed on every tick.
                self.cache_timestamp = Some(Instant::now());
            }
        }
        self.cache.as_deref()
    }

    /// Discard the current cache, forcing the next call to read the feed.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the last load attempt, or `None` if nothing has been tried.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Time since the last successful read.
    pub fn data_age(&self) -> Option<Duration> {
        self.last_successful_fetch.map(|ts| ts.elapsed())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn feed_path(&self) -> &std::path::Path {
        &self.feed_path
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match self.cache_timestamp {
            Some(ts) => ts.elapsed() < self.cache_ttl,
            None => false,
        }
    }

    /// Up to [`MAX_RETRY_ATTEMPTS`] reads with 0 / 100 / 200 ms back-off.
    fn fetch_with_retry(&self, now: NaiveDateTime) -> Result<Vec<VehicleRecord>, MotorwayError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying feed read after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match try_load_feed(&self.feed_path, now) {
                Ok(records) => return Ok(records),
                Err(e) if attempt + 1 < MAX_RETRY_ATTEMPTS => {
                    tracing::debug!(attempt, error = %e, "feed read attempt failed");
                }
                Err(e) => return Err(e),
            }
            attempt += 1;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
