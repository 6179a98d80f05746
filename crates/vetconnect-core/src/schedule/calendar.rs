//! Calendar arithmetic on local wall-clock timestamps.
//!
//! All timestamps are `NaiveDateTime` values already anchored to the
//! caller's local representation. Day arithmetic is calendar arithmetic:
//! adding one day keeps the time of day, whatever the UTC offset does in
//! between. Hour arithmetic adds wall-clock hours.

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Weekday names, sunday first (index 0).
pub const WEEKDAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Calendar arithmetic errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid weekday: {0}")]
    InvalidWeekday(String),

    #[error("Timestamp out of range")]
    OutOfRange,
}

pub type CalendarResult<T> = Result<T, CalendarError>;

/// `base + step_index * hours`.
pub fn advance_by_hours(
    base: NaiveDateTime,
    hours: u32,
    step_index: u32,
) -> CalendarResult<NaiveDateTime> {
    let total = i64::from(hours) * i64::from(step_index);
    let delta = Duration::try_hours(total).ok_or(CalendarError::OutOfRange)?;
    base.checked_add_signed(delta)
        .ok_or(CalendarError::OutOfRange)
}

/// Add (or subtract, when negative) calendar days.
pub fn advance_by_days(base: NaiveDateTime, days: i64) -> CalendarResult<NaiveDateTime> {
    let magnitude = Days::new(days.unsigned_abs());
    let result = if days >= 0 {
        base.checked_add_days(magnitude)
    } else {
        base.checked_sub_days(magnitude)
    };
    result.ok_or(CalendarError::OutOfRange)
}

/// Add calendar weeks.
pub fn advance_by_weeks(base: NaiveDateTime, weeks: i64) -> CalendarResult<NaiveDateTime> {
    let days = weeks.checked_mul(7).ok_or(CalendarError::OutOfRange)?;
    advance_by_days(base, days)
}

/// Map a weekday name to its index (sunday = 0 … saturday = 6).
///
/// Matching ignores ASCII case and surrounding whitespace.
pub fn weekday_index(name: &str) -> CalendarResult<u32> {
    let normalized = name.trim().to_ascii_lowercase();
    WEEKDAY_NAMES
        .iter()
        .position(|day| *day == normalized)
        .map(|i| i as u32)
        .ok_or_else(|| CalendarError::InvalidWeekday(name.to_string()))
}

/// Weekday index of a date (sunday = 0).
pub fn weekday_of(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Days from `from_index` forward to the nearest weekday in `selected`,
/// counting `from_index` itself as distance 0. `None` if `selected` is empty.
pub fn days_until_next(from_index: u32, selected: &[u32]) -> Option<u32> {
    selected
        .iter()
        .map(|&target| (target + 7 - from_index % 7) % 7)
        .min()
}
