//! Timestamp parsing for issue-tracker payloads.
//!
//! Trackers emit ISO-8601 in several dialects: RFC 3339 (`...Z`, `+00:00`),
//! compact offsets with milliseconds (`2024-01-01T09:00:00.000+0000`) and
//! occasionally no offset at all. Offset-less values are read as UTC, so every
//! instant carried through the pipeline has an offset and compares correctly
//! against every other.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

/// A timezone-aware instant as it appeared in the source data.
///
/// The offset written in the input is kept so business-hours windows are evaluated in the
/// wall-clock time of whoever recorded the event.
pub type Timestamp = DateTime<FixedOffset>;

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A string that is not a timestamp in any supported dialect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid timestamp format: '{0}'")]
pub struct InvalidTimestamp(pub String);

/// Parse an ISO-8601 timestamp, treating offset-less input as UTC.
///
/// A bare date (`2024-01-05`) is midnight UTC on that date.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, InvalidTimestamp> {
    let trimmed = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts);
    }

    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(from_naive_utc(naive));
        }
    }

    parse_bare_date(trimmed)
        .map(|date| from_naive_utc(date.and_time(NaiveTime::MIN)))
        .ok_or_else(|| InvalidTimestamp(raw.to_string()))
}

/// Parse the lower bound of a date range.
///
/// A bare date means the start of that day (00:00:00 UTC).
pub fn parse_range_start(raw: &str) -> Result<Timestamp, InvalidTimestamp> {
    parse_timestamp(raw)
}

/// Parse the upper bound of a date range.
///
/// A bare date means the last second of that day (23:59:59 UTC), so that
/// `--to 2024-01-31` still includes events recorded during January 31st.
pub fn parse_range_end(raw: &str) -> Result<Timestamp, InvalidTimestamp> {
    match parse_bare_date(raw.trim()) {
        Some(date) => date
            .and_hms_opt(23, 59, 59)
            .map(from_naive_utc)
            .ok_or_else(|| InvalidTimestamp(raw.to_string())),
        None => parse_timestamp(raw),
    }
}

/// Attach a UTC offset to a naive datetime.
pub fn from_naive_utc(naive: NaiveDateTime) -> Timestamp {
    Utc.from_utc_datetime(&naive).fixed_offset()
}

fn parse_bare_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}
