//! pulse-steps
//!
//! Watermark-driven step sync.
//!
//! Moves fine-grained step buckets from a day-partitioned source to a
//! destination stream, one reference-zone calendar day at a time:
//! - never advances the watermark past an incomplete day
//! - never re-forwards a bucket that starts at or before the watermark
//! - writes each day as one idempotent dataset patch keyed by its time range
//!
//! This crate owns the record model, the completeness predicate, the dataset
//! contract and the engine loop. It performs no IO itself; sources,
//! destinations and the watermark store are capabilities passed in by the
//! caller (CLI).

mod bucket;
mod dataset;
mod engine;
mod record;
mod watermark;

pub use bucket::{DayBoundary, DayBucket};
pub use dataset::{
    ensure_stream, DataPoint, DatasetPatch, StreamDescriptor, StreamId, STEP_COUNT_DATA_TYPE,
};
pub use engine::{load_watermark, run_step_sync, DayOutcome, StepSyncParams, StopReason, SyncError, SyncReport};
pub use record::{ActivityRecord, ForwardRecord, RecordError};
pub use watermark::{format_watermark, parse_watermark, Advance, Watermark};

use chrono::{DateTime, NaiveDate, Utc};
use pulse_schemas::{DestinationWriteError, SourceFetchError, StateError};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Day-partitioned source of step buckets.
pub trait StepSource {
    /// Service name used in log lines and errors (e.g. `"garmin"`).
    fn service(&self) -> &'static str;

    /// All buckets for `day` (reference zone), in any order.
    ///
    /// An empty `Vec` means the source has nothing for that day yet.
    fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ActivityRecord>, SourceFetchError>;
}

/// Destination holding step data in named streams.
pub trait StepDestination {
    fn service(&self) -> &'static str;

    /// Look up an existing stream. Must return
    /// [`DestinationWriteError::NotFound`] when it does not exist.
    fn get_stream(&self, id: &StreamId) -> Result<StreamId, DestinationWriteError>;

    fn create_stream(&self, descriptor: &StreamDescriptor)
        -> Result<StreamId, DestinationWriteError>;

    /// Merge `patch` into its stream. Writing the same patch twice must leave
    /// the stream unchanged (patch semantics, not append).
    fn upsert(&self, patch: &DatasetPatch) -> Result<(), DestinationWriteError>;
}

/// Durable home of the sync watermark.
pub trait WatermarkStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn read_watermark(&self) -> Result<Option<DateTime<Utc>>, StateError>;

    fn write_watermark(&mut self, at: DateTime<Utc>) -> Result<(), StateError>;
}
