//! Fake activity service usable as both sides of a name sync.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pulse_reconcile::{ActivitySource, RenameTarget, SourceActivity};
use pulse_schemas::{DayWindow, DestinationWriteError, SourceFetchError};

/// Holds activities by id. `fetch_activities` filters by the window like a
/// real service would; `rename` applies to the stored activity and is logged.
pub struct FakeActivityService {
    service: &'static str,
    activities: RefCell<BTreeMap<String, SourceActivity>>,
    fetch_error: Option<SourceFetchError>,
    rename_errors: BTreeMap<String, DestinationWriteError>,
    renames: RefCell<Vec<(String, String)>>,
    fetches: Cell<usize>,
}

impl FakeActivityService {
    pub fn new(service: &'static str) -> Self {
        Self {
            service,
            activities: RefCell::new(BTreeMap::new()),
            fetch_error: None,
            rename_errors: BTreeMap::new(),
            renames: RefCell::new(Vec::new()),
            fetches: Cell::new(0),
        }
    }

    pub fn with_activity(self, id: &str, name: &str, start: DateTime<Utc>) -> Self {
        self.activities
            .borrow_mut()
            .insert(id.to_string(), SourceActivity::new(id, name, start));
        self
    }

    pub fn failing_fetch(mut self, err: SourceFetchError) -> Self {
        self.fetch_error = Some(err);
        self
    }

    pub fn failing_rename(mut self, id: &str, err: DestinationWriteError) -> Self {
        self.rename_errors.insert(id.to_string(), err);
        self
    }

    /// `(id, new_name)` of every accepted rename, in call order.
    pub fn renames(&self) -> Vec<(String, String)> {
        self.renames.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    pub fn name_of(&self, id: &str) -> Option<String> {
        self.activities.borrow().get(id).map(|a| a.name.clone())
    }
}

impl ActivitySource for FakeActivityService {
    fn service(&self) -> &'static str {
        self.service
    }

    fn fetch_activities(&self, window: &DayWindow) -> Result<Vec<SourceActivity>, SourceFetchError> {
        self.fetches.set(self.fetches.get() + 1);
        if let Some(e) = &self.fetch_error {
            return Err(e.clone());
        }
        Ok(self
            .activities
            .borrow()
            .values()
            .filter(|a| window.contains(a.start))
            .cloned()
            .collect())
    }
}

impl RenameTarget for FakeActivityService {
    fn service(&self) -> &'static str {
        self.service
    }

    fn rename(&self, id: &str, new_name: &str) -> Result<(), DestinationWriteError> {
        if let Some(e) = self.rename_errors.get(id) {
            return Err(e.clone());
        }
        let mut acts = self.activities.borrow_mut();
        let Some(a) = acts.get_mut(id) else {
            return Err(DestinationWriteError::NotFound {
                service: self.service,
                resource: id.to_string(),
            });
        };
        a.name = new_name.to_string();
        self.renames
            .borrow_mut()
            .push((id.to_string(), new_name.to_string()));
        Ok(())
    }
}
