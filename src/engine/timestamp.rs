//! Timestamp parsing, minute truncation, and step-time extrapolation.

use crate::domain::Timestamp;
use chrono::{DateTime, NaiveDateTime};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unparseable block timestamp {0:?}")]
pub struct TimestampParseError(pub String);

/// Parse a block-timestamp string into unix seconds.
///
/// Accepts RFC 3339 ("2021-01-19T14:44:32Z") and the space-separated forms
/// analytics exports produce ("2021-01-19 14:44:32+00", "2021-01-19
/// 14:44:32"); the offset-less form is taken as UTC.
pub fn parse_block_timestamp(raw: &str) -> Result<Timestamp, TimestampParseError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Timestamp::new(dt.timestamp()));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%#z") {
        return Ok(Timestamp::new(dt.timestamp()));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Timestamp::new(naive.and_utc().timestamp()));
    }
    Err(TimestampParseError(raw.to_string()))
}

/// Parse a block-timestamp string and truncate it to its minute bucket.
pub fn minute_bucket(raw: &str) -> Result<Timestamp, TimestampParseError> {
    parse_block_timestamp(raw).map(|ts| ts.minute_floor())
}

/// Estimates wall-clock time for steps that carry no logged events.
///
/// `estimate = start_ts + (step - start_step) * avg_step_secs`, minute
/// truncated. Estimates feed price lookups only; they are never written
/// into holder state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClock {
    pub start_step: u64,
    pub start_ts: Timestamp,
    pub avg_step_secs: i64,
}

impl StepClock {
    pub fn new(start_step: u64, start_ts: Timestamp, avg_step_secs: i64) -> Self {
        StepClock {
            start_step,
            start_ts,
            avg_step_secs,
        }
    }

    /// Extrapolated minute bucket for `step`. Callers only ask about steps
    /// at or after `start_step`.
    pub fn estimate(&self, step: u64) -> Timestamp {
        let elapsed = step.saturating_sub(self.start_step) as i64 * self.avg_step_secs;
        Timestamp::new(self.start_ts.as_secs() + elapsed).minute_floor()
    }
}
