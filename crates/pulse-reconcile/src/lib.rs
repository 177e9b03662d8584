//! pulse-reconcile
//!
//! Key-matched activity name reconciliation.
//!
//! - Both services are snapshotted over the same day-truncated window
//! - Activities are joined by their formatted start timestamp, nothing fuzzier
//! - Names flow one way: source of truth → target, rename only
//! - Ignore-list prefixes suppress a rename
//! - A failed rename is isolated to its key
//!
//! Deterministic, pure logic. No IO. Services are capabilities passed in.

mod engine;
mod ignore;
mod types;

pub use engine::{
    apply_renames, plan_renames, run_name_sync, NameSyncParams, NameSyncReport, ReconcileError,
    ReconcileOutcome, Rename, RenameFailure, RenamePlan, SkipReason,
};
pub use ignore::IgnoreList;
pub use types::{ActivityMap, JoinKeyFormat, KeyedActivity, SourceActivity, DEFAULT_KEY_FORMAT};

use pulse_schemas::{DayWindow, DestinationWriteError, SourceFetchError};

/// Lists activities started inside a window.
pub trait ActivitySource {
    fn service(&self) -> &'static str;

    fn fetch_activities(&self, window: &DayWindow) -> Result<Vec<SourceActivity>, SourceFetchError>;
}

/// Accepts corrective renames, addressed by the target's own activity id.
pub trait RenameTarget {
    fn service(&self) -> &'static str;

    fn rename(&self, id: &str, new_name: &str) -> Result<(), DestinationWriteError>;
}
