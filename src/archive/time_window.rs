//! Time window parsing
//!
//! A window is configured either as a single instant or as an inclusive
//! `[start, end]` pair. Each bound may be a Unix epoch value or an archive
//! compact timestamp (`YYYYMMDDHHMMSS`, optionally right-truncated).

use crate::{ConfigError, ConfigResult};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;

/// Format of archive compact timestamps
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Completion for right-truncated compact timestamps (month and day default to 01)
const TIMESTAMP_TEMPLATE: &str = "00000101000000";

/// Numeric values strictly between these bounds are Unix epoch seconds
const EPOCH_LOWER_BOUND: f64 = 1e8;
const EPOCH_UPPER_BOUND: f64 = 1e13;

/// A single configured time value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeSpec {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A configured time range: one instant, or a `[start, end]` pair
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeRangeSpec {
    Single(TimeSpec),
    Pair(Vec<TimeSpec>),
}

impl TimeSpec {
    /// Resolves this value to a UTC instant
    pub fn to_instant(&self) -> ConfigResult<DateTime<Utc>> {
        match self {
            TimeSpec::Integer(value) => parse_integer(*value),
            TimeSpec::Float(value) => parse_float(*value),
            TimeSpec::Text(text) => parse_text(text),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Integer(v) => write!(f, "{}", v),
            TimeSpec::Float(v) => write!(f, "{}", v),
            TimeSpec::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for TimeSpec {
    fn from(value: &str) -> Self {
        TimeSpec::Text(value.to_string())
    }
}

/// Inclusive window of archive capture times
///
/// Immutable once built; `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a window from explicit bounds
    ///
    /// # Returns
    ///
    /// * `Ok(TimeWindow)` - The bounds are ordered
    /// * `Err(ConfigError)` - `start` is after `end`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> ConfigResult<Self> {
        if start > end {
            return Err(ConfigError::Validation(format!(
                "time range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Creates a zero-width window at a single instant
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self { start: at, end: at }
    }

    /// Builds a window from its configured form
    ///
    /// # Example
    ///
    /// ```
    /// use wayback_mirror::archive::{TimeRangeSpec, TimeSpec, TimeWindow};
    ///
    /// let spec = TimeRangeSpec::Pair(vec![TimeSpec::from("2019"), TimeSpec::from("202001")]);
    /// let window = TimeWindow::from_spec(&spec).unwrap();
    /// assert_eq!(window.start().timestamp(), 1546300800);
    /// assert_eq!(window.end().timestamp(), 1577836800);
    /// ```
    pub fn from_spec(spec: &TimeRangeSpec) -> ConfigResult<Self> {
        match spec {
            TimeRangeSpec::Single(value) => Ok(Self::instant(value.to_instant()?)),
            TimeRangeSpec::Pair(values) => match values.as_slice() {
                [single] => Ok(Self::instant(single.to_instant()?)),
                [start, end] => Self::new(start.to_instant()?, end.to_instant()?),
                _ => Err(ConfigError::Validation(format!(
                    "time range must have one or two values, got {}",
                    values.len()
                ))),
            },
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns true if `at` falls inside the window (bounds inclusive)
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format(TIMESTAMP_FORMAT),
            self.end.format(TIMESTAMP_FORMAT)
        )
    }
}

/// Parses a 14-digit archive timestamp as UTC
pub fn parse_archive_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    if timestamp.len() != 14 || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn invalid(value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidTime {
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn is_epoch(value: f64) -> bool {
    value > EPOCH_LOWER_BOUND && value < EPOCH_UPPER_BOUND
}

fn parse_integer(value: i64) -> ConfigResult<DateTime<Utc>> {
    if is_epoch(value as f64) {
        return from_epoch(value as f64);
    }
    if value < 0 {
        return Err(invalid(value, "negative values are not timestamps"));
    }
    parse_compact(&value.to_string())
}

fn parse_float(value: f64) -> ConfigResult<DateTime<Utc>> {
    if is_epoch(value) {
        return from_epoch(value);
    }
    if value.fract() == 0.0 && value >= 0.0 && value < EPOCH_LOWER_BOUND {
        return parse_compact(&format!("{}", value as i64));
    }
    Err(invalid(value, "not a Unix epoch or archive timestamp"))
}

fn parse_text(text: &str) -> ConfigResult<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid(text, "empty time value"));
    }

    if trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return match trimmed.parse::<u64>() {
            Ok(value) if is_epoch(value as f64) => from_epoch(value as f64),
            _ => parse_compact(trimmed),
        };
    }

    match trimmed.parse::<f64>() {
        Ok(value) if is_epoch(value) => from_epoch(value),
        _ => Err(invalid(text, "not a Unix epoch or archive timestamp")),
    }
}

fn from_epoch(seconds: f64) -> ConfigResult<DateTime<Utc>> {
    let whole = seconds.trunc() as i64;
    let nanos = ((seconds - seconds.trunc()) * 1e9).round() as u32;
    DateTime::from_timestamp(whole, nanos.min(999_999_999))
        .ok_or_else(|| invalid(seconds, "epoch value out of range"))
}

fn parse_compact(digits: &str) -> ConfigResult<DateTime<Utc>> {
    if digits.len() < 4 || digits.len() > TIMESTAMP_TEMPLATE.len() {
        return Err(invalid(
            digits,
            "archive timestamps need between 4 and 14 digits",
        ));
    }

    let completed = format!("{}{}", digits, &TIMESTAMP_TEMPLATE[digits.len()..]);
    parse_archive_timestamp(&completed)
        .ok_or_else(|| invalid(digits, "not a valid YYYYMMDDHHMMSS timestamp"))
}
