use std::fmt;

use pulse_schemas::StateError;
use tracing::{info, warn};

use crate::snapshot::{detect_change, ChangeEvent, IndexSnapshot};
use crate::{Notifier, NotifyError, SnapshotStore};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexCheckReport {
    pub current: IndexSnapshot,
    pub previous: Option<IndexSnapshot>,
    /// Set when the snapshot changed and the notifier accepted it.
    pub event: Option<ChangeEvent>,
}

impl IndexCheckReport {
    pub fn changed(&self) -> bool {
        self.event.is_some()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IndexError {
    Notify(NotifyError),
    State(StateError),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::Notify(e) => write!(f, "INDEX_NOTIFY_FAILED: {e}"),
            IndexError::State(e) => write!(f, "INDEX_STATE: {e}"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Compare `current` with the stored snapshot and notify on change.
///
/// The stored snapshot is replaced only after `notifier` succeeded, so a
/// failed delivery is attempted again on the next run.
pub fn run_index_check(
    current: IndexSnapshot,
    store: &mut dyn SnapshotStore,
    notifier: &dyn Notifier,
    recipient: &str,
) -> Result<IndexCheckReport, IndexError> {
    let previous = match store.read_snapshot() {
        Ok(p) => p,
        Err(StateError::Malformed { path, detail }) => {
            warn!(path = %path, detail = %detail, "stored snapshot is malformed, overwriting");
            None
        }
        Err(e) => return Err(IndexError::State(e)),
    };

    let Some(event) = detect_change(previous.as_ref(), &current) else {
        info!(date = %current.date, "index unchanged");
        return Ok(IndexCheckReport {
            current,
            previous,
            event: None,
        });
    };

    info!(
        date = %current.date,
        signal = %current.signal,
        score = current.score,
        trend = event.trend.label(),
        "index changed"
    );

    notifier
        .send(recipient, &event.message())
        .map_err(IndexError::Notify)?;
    store.write_snapshot(&current).map_err(IndexError::State)?;

    Ok(IndexCheckReport {
        current,
        previous,
        event: Some(event),
    })
}
