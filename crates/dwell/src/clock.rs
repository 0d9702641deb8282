//! Business-hours arithmetic.
//!
//! A [`BusinessHoursWindow`] is an hour-of-day range applied to weekdays
//! (Monday through Friday). [`business_hours`] counts how much of an interval
//! falls inside that window, evaluated in the wall-clock offset of the
//! interval's start.
//!
//! # Example
//!
//! ```
//! use dwell::clock::{business_hours, BusinessHoursWindow};
//! use dwell::timestamp::parse_timestamp;
//!
//! let window = BusinessHoursWindow::default(); // 9:00 - 17:00
//! let friday = parse_timestamp("2024-01-05T16:00:00Z").unwrap();
//! let monday = parse_timestamp("2024-01-08T10:00:00Z").unwrap();
//!
//! assert_eq!(business_hours(&friday, &monday, &window), 2.0);
//! ```

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use thiserror::Error;

use crate::timestamp::Timestamp;

pub const DEFAULT_START_HOUR: u32 = 9;
pub const DEFAULT_END_HOUR: u32 = 17;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Errors raised when constructing a [`BusinessHoursWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowError {
    #[error("Invalid business hour {0}: must be between 0 and 23")]
    HourOutOfRange(u32),

    #[error("Business hours start ({start}) must be before end ({end})")]
    EmptyWindow { start: u32, end: u32 },
}

/// Hour-of-day range counted as working time on weekdays.
///
/// Immutable once constructed; share it by copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessHoursWindow {
    start_hour: u32,
    end_hour: u32,
}

impl BusinessHoursWindow {
    /// Create a window, validating `0 <= start < end <= 23`.
    pub fn new(start_hour: u32, end_hour: u32) -> Result<Self, WindowError> {
        for hour in [start_hour, end_hour] {
            if hour > 23 {
                return Err(WindowError::HourOutOfRange(hour));
            }
        }
        if start_hour >= end_hour {
            return Err(WindowError::EmptyWindow {
                start: start_hour,
                end: end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }

    /// Length of one full business day in hours.
    pub fn hours_per_day(&self) -> u32 {
        self.end_hour - self.start_hour
    }

    fn opening(&self) -> NaiveTime {
        NaiveTime::MIN + Duration::hours(i64::from(self.start_hour))
    }

    fn closing(&self) -> NaiveTime {
        NaiveTime::MIN + Duration::hours(i64::from(self.end_hour))
    }
}

impl Default for BusinessHoursWindow {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            end_hour: DEFAULT_END_HOUR,
        }
    }
}

/// Saturday and Sunday never count.
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business hours elapsed between `start` and `end`.
///
/// Returns 0 when `start >= end`. Dates are walked in the offset of `start`;
/// `end` is first expressed in that same offset. Runs in time proportional to
/// the number of calendar days spanned.
pub fn business_hours(start: &Timestamp, end: &Timestamp, window: &BusinessHoursWindow) -> f64 {
    if start >= end {
        return 0.0;
    }

    // Fixed offsets have no DST, so local wall-clock differences equal real ones.
    let from = start.naive_local();
    let until = end.with_timezone(start.offset()).naive_local();
    let last_day = until.date();

    let mut total = Duration::zero();
    for day in from.date().iter_days().take_while(|day| *day <= last_day) {
        if !is_business_day(day) {
            continue;
        }

        let day_open = day.and_time(window.opening()).max(from);
        let day_close = day.and_time(window.closing()).min(until);
        if day_close > day_open {
            total += day_close - day_open;
        }
    }

    total.num_milliseconds() as f64 / MILLIS_PER_HOUR
}
