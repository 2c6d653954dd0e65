//! Update scheduling: target date and "is a refresh due" decision.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::types::{BrdcError, Result};

/// Timestamp layout of `last_date` in params.ini.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// The archive publishes a day's file after the day ends, so runs target
/// the previous calendar day.
pub fn default_target_date(now: NaiveDateTime) -> NaiveDate {
    now.date() - Duration::days(1)
}

/// True when at least one full day (24h) has passed since `last_update`.
///
/// A missing timestamp always means an update is due.
pub fn update_due(last_update: Option<NaiveDateTime>, now: NaiveDateTime) -> bool {
    match last_update {
        Some(last) => (now - last).num_days() > 0,
        None => true,
    }
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a params.ini timestamp. Fractional seconds are optional.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map_err(|e| BrdcError::Config(format!("invalid last_date '{s}': {e}")))
}

/// Parse a `YYYY-MM-DD` date given on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| BrdcError::InvalidDate(s.into()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
