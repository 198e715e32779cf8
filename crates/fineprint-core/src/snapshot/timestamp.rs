//! Archive timestamps: `YYYYMMDDhhmmss` in UTC.

use crate::errors::{FinePrintError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};

const FORMAT: &str = "%Y%m%d%H%M%S";
const DIGITS: usize = 14;

/// Parse a 14-digit archive timestamp
///
/// Archives occasionally append sub-second digits; anything after the
/// fourteenth digit must still be a digit and is ignored.
///
/// # Errors
///
/// `MalformedTimestamp` if the value is shorter than 14 characters, contains
/// a non-digit, or does not name a valid date-time.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let malformed = |reason: &str| FinePrintError::MalformedTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if value.len() < DIGITS {
        return Err(malformed("expected at least 14 digits"));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed("contains a non-digit character"));
    }

    NaiveDateTime::parse_from_str(&value[..DIGITS], FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| malformed(&e.to_string()))
}

pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(FORMAT).to_string()
}
