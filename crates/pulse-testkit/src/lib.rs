//! pulse-testkit
//!
//! In-memory fakes for every capability the engines consume, plus the
//! cross-crate scenarios under `tests/`.
//!
//! Fakes take `&self` where the traits do and record every call, so a test
//! can assert both on the engine's report and on what reached the outside
//! world. No network, no clock, no randomness.

mod index;
mod names;
mod steps;

pub use index::{MemorySnapshotStore, RecordingNotifier};
pub use names::FakeActivityService;
pub use steps::{
    day_buckets, MemoryWatermarkStore, RecordingStepDestination, ScriptedStepSource, BUCKET_MINUTES,
};
