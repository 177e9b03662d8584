//! pulse-index
//!
//! Change detection for the published business-cycle index.
//!
//! Reads the latest valid row of the published CSV, compares it with the
//! last persisted snapshot and emits one notification per transition. The
//! snapshot is persisted only after the notifier accepted the event.

mod check;
mod csv_source;
mod snapshot;

pub use check::{run_index_check, IndexCheckReport, IndexError};
pub use csv_source::{parse_index_csv, read_index_csv, IndexCsvError};
pub use snapshot::{detect_change, render_summary, ChangeEvent, IndexSnapshot, Trend};

use std::fmt;

use pulse_schemas::StateError;

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Durable home of the last-seen snapshot.
pub trait SnapshotStore {
    /// `Ok(None)` on first run. `StateError::Malformed` when the stored value
    /// cannot be decoded.
    fn read_snapshot(&self) -> Result<Option<IndexSnapshot>, StateError>;

    fn write_snapshot(&mut self, snapshot: &IndexSnapshot) -> Result<(), StateError>;
}

pub trait Notifier {
    fn name(&self) -> &'static str;

    fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifyError {
    /// No delivery route is configured for the recipient.
    UnknownRecipient(String),
    Transport(String),
    Rejected { status: u16, message: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::UnknownRecipient(r) => write!(f, "no route for recipient '{r}'"),
            NotifyError::Transport(d) => write!(f, "notify transport error: {d}"),
            NotifyError::Rejected { status, message } => {
                write!(f, "notify rejected status={status}: {message}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

/// Writes the notification to the log instead of delivering it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        tracing::info!(recipient, text, "notification");
        Ok(())
    }
}
