//! Time-of-day normalization and wraparound duration arithmetic.
//!
//! Every time value entering the reconciler goes through [`TimeOfDay::parse`],
//! so comparisons between a freshly submitted time and a stored one never
//! depend on how either was originally written (`8:00` vs `08:00:00`).

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seconds in one day on a 24-hour clock.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Accepted input layouts, tried in order.
///
/// `chrono` accepts single-digit fields for `%H`, `%I`, `%M` and `%S`, which
/// covers inputs with or without leading zeros.
const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I:%M:%S%p",
    "%I:%M%p",
];

/// A string that could not be interpreted as a time of day.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day: {0:?}")]
pub struct InvalidTimeFormat(pub String);

/// A time of day with one-second resolution.
///
/// Stored as seconds since midnight in `[0, 86399]`. The canonical string form
/// is zero-padded `HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    /// Midnight, `00:00:00`.
    pub const MIDNIGHT: Self = Self(0);

    /// Parses a time-of-day string into its canonical value.
    pub fn parse(raw: &str) -> Result<Self, InvalidTimeFormat> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidTimeFormat(raw.to_string()));
        }

        TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
            // Leap seconds (`23:59:60`) come back with an overflowing fraction.
            .filter(|time| time.nanosecond() < 1_000_000_000)
            .map(|time| Self(time.num_seconds_from_midnight()))
            .ok_or_else(|| InvalidTimeFormat(raw.to_string()))
    }

    /// Builds a time from seconds since midnight, if in range.
    #[cfg(test)]
    #[must_use]
    pub const fn from_seconds(seconds: u32) -> Option<Self> {
        if seconds < SECONDS_PER_DAY {
            Some(Self(seconds))
        } else {
            None
        }
    }

    /// Builds a time from hour, minute and second fields, if in range.
    #[cfg(test)]
    #[must_use]
    pub const fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        if hour < 24 && minute < 60 && second < 60 {
            Some(Self(hour * 3600 + minute * 60 + second))
        } else {
            None
        }
    }

    /// Seconds since midnight, in `[0, 86399]`.
    #[must_use]
    pub const fn to_seconds(self) -> u32 {
        self.0
    }

    /// Duration from `self` until `end`, wrapping past midnight.
    #[must_use]
    pub const fn seconds_until(self, end: Self) -> u32 {
        duration(self, end)
    }
}

/// Computes the wraparound-aware duration between two times, in seconds.
///
/// When `end` is earlier than `start` the interval is taken to span midnight.
/// Equal times yield zero.
#[must_use]
pub const fn duration(start: TimeOfDay, end: TimeOfDay) -> u32 {
    if end.0 >= start.0 {
        end.0 - start.0
    } else {
        (SECONDS_PER_DAY - start.0) + end.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;
        write!(f, "{hours:02}:{minutes:02}:{seconds:02}")
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Formats a number of seconds as `Hh Mm` for human-facing output.
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
