//! Timestamp token parsing.
//!
//! Numeric tokens are disambiguated by magnitude: values that would land
//! between 2000-01-01 and roughly the year 31969 *as seconds* are treated as
//! seconds, everything else as milliseconds. Non-numeric tokens go through
//! the common civil-datetime shapes and are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// 2000-01-01T00:00:00Z in seconds since the epoch
const EPOCH_2000_S: f64 = 946_684_800.0;
/// The same instant in milliseconds; the upper bound of the seconds window
const EPOCH_2000_MS: f64 = 946_684_800_000.0;

const CIVIL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse one timestamp token into milliseconds since the epoch.
pub fn parse_timestamp(token: &str) -> Option<u64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    if let Ok(n) = token.parse::<f64>() {
        if !n.is_finite() || n < 0.0 {
            return None;
        }
        return Some(if (EPOCH_2000_S..EPOCH_2000_MS).contains(&n) {
            (n * 1000.0) as u64
        } else {
            n as u64
        });
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(token) {
        return u64::try_from(dt.timestamp_millis()).ok();
    }
    for format in CIVIL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return u64::try_from(naive.and_utc().timestamp_millis()).ok();
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return u64::try_from(naive.and_utc().timestamp_millis()).ok();
    }
    None
}
