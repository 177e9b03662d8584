//! pulse-schemas
//!
//! Shared vocabulary for the pulse jobs:
//! - error taxonomy used at every capability boundary
//! - fetch-status classification consumed by the engine loops
//! - reference-timezone day arithmetic
//!
//! Deterministic, pure logic. No IO, no wall-clock.

mod errors;
mod fetch;
mod zone;

pub use errors::{status_hint, ConfigError, DestinationWriteError, SourceFetchError, StateError};
pub use fetch::FetchStatus;
pub use zone::{DayWindow, RefZone};
