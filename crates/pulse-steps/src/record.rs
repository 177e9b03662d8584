use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One fine-grained step bucket as reported by the source.
///
/// Invariant: `end > start`. `value` may be zero; zero buckets still count
/// for day completeness but are never forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    EndNotAfterStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordError::EndNotAfterStart { start, end } => write!(
                f,
                "record end {} is not after start {}",
                end.to_rfc3339(),
                start.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for RecordError {}

impl ActivityRecord {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, value: i64) -> Result<Self, RecordError> {
        if end <= start {
            return Err(RecordError::EndNotAfterStart { start, end });
        }
        Ok(Self { start, end, value })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn to_forward(&self) -> ForwardRecord {
        ForwardRecord {
            start_millis: self.start.timestamp_millis(),
            end_millis: self.end.timestamp_millis(),
            value: self.value,
        }
    }
}

/// A record selected for forwarding, at millisecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForwardRecord {
    pub start_millis: i64,
    pub end_millis: i64,
    pub value: i64,
}
