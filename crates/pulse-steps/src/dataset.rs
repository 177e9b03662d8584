//! Destination stream identity and the idempotent dataset patch.
//!
//! A day's forwarded records are written as one patch whose dataset id is
//! derived from its own content range (`"{minStartNs}-{maxEndNs}"`). Writing
//! the same records again addresses the same dataset, so the destination
//! merges instead of appending.

use std::fmt;

use pulse_schemas::DestinationWriteError;
use tracing::info;

use crate::record::ForwardRecord;
use crate::StepDestination;

pub const STEP_COUNT_DATA_TYPE: &str = "com.google.step_count.delta";

const NANOS_PER_MILLI: i64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StreamId(String);

impl StreamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the derived step stream this job owns at the destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamDescriptor {
    pub project_number: String,
    pub manufacturer: String,
    pub model: String,
    pub uid_suffix: String,
    pub stream_name: String,
    pub application_name: String,
    pub application_version: String,
}

impl StreamDescriptor {
    pub fn device_uid(&self) -> String {
        format!("vdev-{}", self.uid_suffix)
    }

    /// Deterministic id: the same descriptor always names the same stream.
    pub fn stream_id(&self) -> StreamId {
        StreamId(format!(
            "derived:{}:{}:{}:{}:{}:{}",
            STEP_COUNT_DATA_TYPE,
            self.project_number,
            self.manufacturer,
            self.model,
            self.device_uid(),
            self.stream_name
        ))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataPoint {
    pub start_nanos: i64,
    pub end_nanos: i64,
    pub value: i64,
}

impl From<&ForwardRecord> for DataPoint {
    fn from(r: &ForwardRecord) -> Self {
        Self {
            start_nanos: r.start_millis * NANOS_PER_MILLI,
            end_nanos: r.end_millis * NANOS_PER_MILLI,
            value: r.value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetPatch {
    stream: StreamId,
    min_start_nanos: i64,
    max_end_nanos: i64,
    points: Vec<DataPoint>,
}

impl DatasetPatch {
    /// `None` for an empty record list; a patch always has at least one point.
    ///
    /// Records are expected in start order (as produced by `DayBucket`). The
    /// range is taken from the first start and the last end.
    pub fn new(stream: StreamId, records: &[ForwardRecord]) -> Option<Self> {
        let first = records.first()?;
        let last = records.last()?;
        Some(Self {
            stream,
            min_start_nanos: first.start_millis * NANOS_PER_MILLI,
            max_end_nanos: last.end_millis * NANOS_PER_MILLI,
            points: records.iter().map(DataPoint::from).collect(),
        })
    }

    pub fn stream(&self) -> &StreamId {
        &self.stream
    }

    pub fn dataset_id(&self) -> String {
        format!("{}-{}", self.min_start_nanos, self.max_end_nanos)
    }

    pub fn min_start_nanos(&self) -> i64 {
        self.min_start_nanos
    }

    pub fn max_end_nanos(&self) -> i64 {
        self.max_end_nanos
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }
}

/// Get-or-create the stream named by `descriptor`.
pub fn ensure_stream(
    dest: &dyn StepDestination,
    descriptor: &StreamDescriptor,
) -> Result<StreamId, DestinationWriteError> {
    let id = descriptor.stream_id();
    match dest.get_stream(&id) {
        Ok(found) => Ok(found),
        Err(e) if e.is_not_found() => {
            info!(service = dest.service(), stream = %id, "stream not found, creating");
            dest.create_stream(descriptor)
        }
        Err(e) => Err(e),
    }
}
