//! Fakes for the step sync engine.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use pulse_schemas::{DestinationWriteError, RefZone, SourceFetchError, StateError};
use pulse_steps::{
    ActivityRecord, DataPoint, DatasetPatch, StepDestination, StepSource, StreamDescriptor,
    StreamId, WatermarkStore,
};

pub const BUCKET_MINUTES: i64 = 15;

/// `slots` consecutive 15-minute buckets from local midnight of `day`.
/// `value(i)` gives the step count of slot `i`; a full day is 96 slots.
pub fn day_buckets(
    day: NaiveDate,
    zone: RefZone,
    slots: usize,
    value: impl Fn(usize) -> i64,
) -> Vec<ActivityRecord> {
    let midnight = zone.start_of_day(day);
    (0..slots)
        .filter_map(|i| {
            let start = midnight + Duration::minutes(BUCKET_MINUTES * i as i64);
            ActivityRecord::new(start, start + Duration::minutes(BUCKET_MINUTES), value(i)).ok()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Serves a fixed answer per day. Unscripted days are empty.
#[derive(Default)]
pub struct ScriptedStepSource {
    days: BTreeMap<NaiveDate, Result<Vec<ActivityRecord>, SourceFetchError>>,
    fetched: RefCell<Vec<NaiveDate>>,
}

impl ScriptedStepSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, day: NaiveDate, records: Vec<ActivityRecord>) -> Self {
        self.days.insert(day, Ok(records));
        self
    }

    pub fn with_error(mut self, day: NaiveDate, err: SourceFetchError) -> Self {
        self.days.insert(day, Err(err));
        self
    }

    /// Replace a day's answer between runs (e.g. the day filled up).
    pub fn set_day(&mut self, day: NaiveDate, records: Vec<ActivityRecord>) {
        self.days.insert(day, Ok(records));
    }

    pub fn fetched_days(&self) -> Vec<NaiveDate> {
        self.fetched.borrow().clone()
    }
}

impl StepSource for ScriptedStepSource {
    fn service(&self) -> &'static str {
        "scripted"
    }

    fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ActivityRecord>, SourceFetchError> {
        self.fetched.borrow_mut().push(day);
        self.days.get(&day).cloned().unwrap_or(Ok(Vec::new()))
    }
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// Stores points keyed by `(stream, start, end)`, so writing the same patch
/// again overwrites instead of duplicating.
#[derive(Default)]
pub struct RecordingStepDestination {
    streams: RefCell<BTreeSet<StreamId>>,
    points: RefCell<BTreeMap<(StreamId, i64, i64), i64>>,
    dataset_ids: RefCell<Vec<String>>,
    creates: Cell<usize>,
    fail_next: RefCell<Option<DestinationWriteError>>,
}

impl RecordingStepDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(self, id: StreamId) -> Self {
        self.streams.borrow_mut().insert(id);
        self
    }

    /// The next `upsert` fails with `err`; later ones succeed again.
    pub fn fail_next_upsert(&self, err: DestinationWriteError) {
        *self.fail_next.borrow_mut() = Some(err);
    }

    pub fn points(&self, stream: &StreamId) -> Vec<DataPoint> {
        self.points
            .borrow()
            .iter()
            .filter(|((s, _, _), _)| s == stream)
            .map(|((_, start_nanos, end_nanos), value)| DataPoint {
                start_nanos: *start_nanos,
                end_nanos: *end_nanos,
                value: *value,
            })
            .collect()
    }

    /// Dataset ids of every accepted upsert, in call order.
    pub fn dataset_ids(&self) -> Vec<String> {
        self.dataset_ids.borrow().clone()
    }

    pub fn upsert_count(&self) -> usize {
        self.dataset_ids.borrow().len()
    }

    pub fn create_count(&self) -> usize {
        self.creates.get()
    }
}

impl StepDestination for RecordingStepDestination {
    fn service(&self) -> &'static str {
        "recording"
    }

    fn get_stream(&self, id: &StreamId) -> Result<StreamId, DestinationWriteError> {
        if self.streams.borrow().contains(id) {
            Ok(id.clone())
        } else {
            Err(DestinationWriteError::NotFound {
                service: "recording",
                resource: id.to_string(),
            })
        }
    }

    fn create_stream(&self, descriptor: &StreamDescriptor) -> Result<StreamId, DestinationWriteError> {
        let id = descriptor.stream_id();
        self.streams.borrow_mut().insert(id.clone());
        self.creates.set(self.creates.get() + 1);
        Ok(id)
    }

    fn upsert(&self, patch: &DatasetPatch) -> Result<(), DestinationWriteError> {
        if let Some(err) = self.fail_next.borrow_mut().take() {
            return Err(err);
        }
        if !self.streams.borrow().contains(patch.stream()) {
            return Err(DestinationWriteError::NotFound {
                service: "recording",
                resource: patch.stream().to_string(),
            });
        }
        let mut points = self.points.borrow_mut();
        for p in patch.points() {
            points.insert((patch.stream().clone(), p.start_nanos, p.end_nanos), p.value);
        }
        self.dataset_ids.borrow_mut().push(patch.dataset_id());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Watermark store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryWatermarkStore {
    at: Option<DateTime<Utc>>,
    history: Vec<DateTime<Utc>>,
}

impl MemoryWatermarkStore {
    pub fn new(at: Option<DateTime<Utc>>) -> Self {
        Self {
            at,
            history: Vec::new(),
        }
    }

    pub fn at(&self) -> Option<DateTime<Utc>> {
        self.at
    }

    /// Every value written, oldest first.
    pub fn history(&self) -> &[DateTime<Utc>] {
        &self.history
    }
}

impl WatermarkStore for MemoryWatermarkStore {
    fn read_watermark(&self) -> Result<Option<DateTime<Utc>>, StateError> {
        Ok(self.at)
    }

    fn write_watermark(&mut self, at: DateTime<Utc>) -> Result<(), StateError> {
        self.at = Some(at);
        self.history.push(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn full_day_ends_at_boundary_slot() {
        let zone = RefZone::default();
        let day = NaiveDate::from_ymd_opt(2025, 5, 16).unwrap();
        let recs = day_buckets(day, zone, 96, |_| 0);
        assert_eq!(recs.len(), 96);
        let last = zone.local_time_of(recs[95].start());
        assert_eq!((last.hour(), last.minute()), (23, 45));
    }

    #[test]
    fn repeated_patch_merges() {
        let zone = RefZone::default();
        let day = NaiveDate::from_ymd_opt(2025, 5, 16).unwrap();
        let stream = StreamId::new("s");
        let dest = RecordingStepDestination::new().with_stream(stream.clone());
        let fwd: Vec<_> = day_buckets(day, zone, 4, |i| i as i64 + 1)
            .iter()
            .map(ActivityRecord::to_forward)
            .collect();
        let patch = DatasetPatch::new(stream.clone(), &fwd).unwrap();

        dest.upsert(&patch).unwrap();
        dest.upsert(&patch).unwrap();
        assert_eq!(dest.points(&stream).len(), 4);
        assert_eq!(dest.upsert_count(), 2);
    }
}
