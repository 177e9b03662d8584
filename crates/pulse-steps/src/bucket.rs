//! Day buckets and the completeness predicate.
//!
//! A day is complete when its last bucket (by start time) begins at the
//! collection boundary slot in the reference zone. With 15-minute buckets
//! that slot is 23:45. Only the local hour and minute are compared.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use pulse_schemas::{ConfigError, RefZone};

use crate::record::{ActivityRecord, ForwardRecord};
use crate::watermark::Watermark;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Start time of the last bucket of a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DayBoundary {
    last_slot: NaiveTime,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self {
            last_slot: NaiveTime::from_hms_opt(23, 45, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl DayBoundary {
    /// `bucket_minutes` must be positive and divide a day evenly.
    pub fn from_bucket_minutes(bucket_minutes: u32) -> Result<Self, ConfigError> {
        if bucket_minutes == 0 || MINUTES_PER_DAY % bucket_minutes != 0 {
            return Err(ConfigError::malformed(
                "steps.bucket_minutes",
                format!("{bucket_minutes} does not divide a day into whole buckets"),
            ));
        }
        let slot = MINUTES_PER_DAY - bucket_minutes;
        let last_slot = NaiveTime::from_hms_opt(slot / 60, slot % 60, 0).ok_or_else(|| {
            ConfigError::malformed("steps.bucket_minutes", format!("slot {slot} out of range"))
        })?;
        Ok(Self { last_slot })
    }

    pub fn last_slot(&self) -> NaiveTime {
        self.last_slot
    }

    fn matches(&self, local: NaiveTime) -> bool {
        local.hour() == self.last_slot.hour() && local.minute() == self.last_slot.minute()
    }
}

/// All records fetched for one reference-zone day, ordered by start time.
#[derive(Clone, Debug)]
pub struct DayBucket {
    day: NaiveDate,
    records: Vec<ActivityRecord>,
}

impl DayBucket {
    pub fn new(day: NaiveDate, mut records: Vec<ActivityRecord>) -> Self {
        records.sort_by_key(|r| r.start());
        Self { day, records }
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn last_start(&self) -> Option<DateTime<Utc>> {
        self.records.last().map(ActivityRecord::start)
    }

    pub fn is_complete(&self, zone: RefZone, boundary: DayBoundary) -> bool {
        self.last_start()
            .map(|t| boundary.matches(zone.local_time_of(t)))
            .unwrap_or(false)
    }

    /// Records with a positive value that start strictly after `watermark`.
    pub fn forwardable(&self, watermark: &Watermark) -> Vec<ForwardRecord> {
        self.records
            .iter()
            .filter(|r| r.value() > 0 && r.start() > watermark.at())
            .map(ActivityRecord::to_forward)
            .collect()
    }
}
