//! Fakes for the index change check.

use std::cell::RefCell;

use pulse_index::{IndexSnapshot, Notifier, NotifyError, SnapshotStore};
use pulse_schemas::StateError;

#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshot: Option<IndexSnapshot>,
    malformed: bool,
    writes: usize,
}

impl MemorySnapshotStore {
    pub fn new(snapshot: Option<IndexSnapshot>) -> Self {
        Self {
            snapshot,
            ..Self::default()
        }
    }

    /// Reads fail as if the stored file were corrupt, until the next write.
    pub fn malformed() -> Self {
        Self {
            malformed: true,
            ..Self::default()
        }
    }

    pub fn snapshot(&self) -> Option<&IndexSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read_snapshot(&self) -> Result<Option<IndexSnapshot>, StateError> {
        if self.malformed {
            return Err(StateError::Malformed {
                path: "memory".to_string(),
                detail: "corrupt".to_string(),
            });
        }
        Ok(self.snapshot.clone())
    }

    fn write_snapshot(&mut self, snapshot: &IndexSnapshot) -> Result<(), StateError> {
        self.snapshot = Some(snapshot.clone());
        self.malformed = false;
        self.writes += 1;
        Ok(())
    }
}

/// Records `(recipient, text)` of every accepted message.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<(String, String)>>,
    fail_with: RefCell<Option<NotifyError>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next send fails with `err`.
    pub fn fail_next(&self, err: NotifyError) {
        *self.fail_with.borrow_mut() = Some(err);
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.borrow().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        if let Some(e) = self.fail_with.borrow_mut().take() {
            return Err(e);
        }
        self.sent
            .borrow_mut()
            .push((recipient.to_string(), text.to_string()));
        Ok(())
    }
}
