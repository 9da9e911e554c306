//! Wall-clock snapshots and time sources

use crate::{Error, Result};
use chrono::{Datelike, Local, NaiveDateTime, Timelike};

/// Formats accepted by [`TimeValue::parse`], tried in order.
const PARSE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A broken-down local time, sampled once per rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeValue {
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
    /// 0-999
    pub millisecond: u16,
}

impl TimeValue {
    /// Creates a new time value
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
    ) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        }
    }

    /// Builds a snapshot from a chrono date-time.
    ///
    /// A leap second (nanoseconds >= 1e9) is reported as millisecond 999.
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        let year = dt.year().clamp(0, i32::from(u16::MAX)) as u16;
        let millisecond = (dt.nanosecond() / 1_000_000).min(999) as u16;

        Self {
            year,
            month: dt.month() as u8,
            day: dt.day() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
            second: dt.second() as u8,
            millisecond,
        }
    }

    /// Parses `YYYY-MM-DD HH:MM:SS[.fff]` (a `T` separator is also accepted)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        PARSE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(Self::from_naive)
            .ok_or_else(|| Error::InvalidTimeValue(s.to_string()))
    }
}

/// Something that can report the current local wall-clock time
pub trait TimeSource {
    fn now(&self) -> TimeValue;
}

/// The system clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl TimeSource for LocalClock {
    fn now(&self) -> TimeValue {
        TimeValue::from_naive(Local::now().naive_local())
    }
}

/// A clock stopped at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub TimeValue);

impl TimeSource for FixedClock {
    fn now(&self) -> TimeValue {
        self.0
    }
}
