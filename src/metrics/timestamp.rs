//! Departure timestamp handling.
//!
//! Source timestamps are local wall-clock values written as
//! `D.M.YYYY HH:MM:SS`. They are parsed without any timezone conversion.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{PipelineError, Result};
use crate::join::JoinedRecord;

/// Date recorded in place of a real departure that was never observed.
///
/// Records carrying it have no usable real departure and are excluded from
/// every aggregate. The value may appear bare or followed by a midnight time.
pub const NO_REAL_DEPARTURE: &str = "1.1.1900";

const DATE_TIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// Returns `true` when `real_departure` holds the "not observed" sentinel.
///
/// Only the bare date or the date at midnight match; any other time on that
/// day is an ordinary timestamp.
pub fn is_unobserved(real_departure: &str) -> bool {
    let mut parts = real_departure.split_whitespace();
    if parts.next() != Some(NO_REAL_DEPARTURE) {
        return false;
    }
    match (parts.next(), parts.next()) {
        (None, _) => true,
        (Some(time), None) => ["%H:%M:%S", "%H:%M"]
            .iter()
            .any(|format| NaiveTime::parse_from_str(time, format) == Ok(NaiveTime::MIN)),
        _ => false,
    }
}

/// Parses a departure timestamp.
///
/// A bare date is read as midnight of that day.
pub fn parse_departure(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    for format in DATE_TIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(ts) = date.and_hms_opt(0, 0, 0) {
                return Ok(ts);
            }
        }
    }

    Err(PipelineError::TimestampParse {
        value: value.to_string(),
    })
}

/// A joined record with both departure timestamps parsed.
#[derive(Debug, Clone, Copy)]
pub struct Departure<'a> {
    pub record: &'a JoinedRecord,
    pub scheduled: NaiveDateTime,
    pub real: NaiveDateTime,
}

impl<'a> Departure<'a> {
    pub fn parse(record: &'a JoinedRecord) -> Result<Self> {
        Ok(Self {
            record,
            scheduled: parse_departure(&record.scheduled_departure)?,
            real: parse_departure(&record.real_departure)?,
        })
    }

    /// Hour of day (0-23) of the scheduled departure.
    pub fn scheduled_hour(&self) -> u32 {
        self.scheduled.hour()
    }
}
