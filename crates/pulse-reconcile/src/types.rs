use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// Default join key: second resolution, UTC.
pub const DEFAULT_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An activity as listed by either service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceActivity {
    pub id: String,
    pub name: String,
    pub start: DateTime<Utc>,
}

impl SourceActivity {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start,
        }
    }
}

/// Formats start instants into join keys.
///
/// Both sides of a reconciliation must use the same format; the key is only
/// ever compared by exact string equality.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinKeyFormat {
    pattern: String,
}

impl Default for JoinKeyFormat {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_FORMAT)
    }
}

impl JoinKeyFormat {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn key(&self, start: DateTime<Utc>) -> String {
        start.format(&self.pattern).to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct KeyedActivity {
    #[serde(skip)]
    pub key: String,
    pub id: String,
    pub name: String,
}

/// Activities of one service keyed by join key.
///
/// Serializes as a key-sorted JSON object `{key: {id, name}}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ActivityMap {
    entries: BTreeMap<String, KeyedActivity>,
}

impl ActivityMap {
    /// Later activities with an already-seen key replace earlier ones.
    pub fn build(
        service: &str,
        activities: impl IntoIterator<Item = SourceActivity>,
        format: &JoinKeyFormat,
    ) -> Self {
        let mut entries = BTreeMap::new();
        for a in activities {
            let key = format.key(a.start);
            let keyed = KeyedActivity {
                key: key.clone(),
                id: a.id,
                name: a.name,
            };
            if let Some(prev) = entries.insert(key.clone(), keyed) {
                warn!(service, key = %key, replaced_id = %prev.id, "duplicate join key");
            }
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&KeyedActivity> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyedActivity> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_is_second_resolution_utc() {
        let t = Utc.with_ymd_and_hms(2025, 5, 16, 1, 2, 3).unwrap()
            + chrono::Duration::milliseconds(999);
        assert_eq!(JoinKeyFormat::default().key(t), "2025-05-16 01:02:03");
    }

    #[test]
    fn duplicate_key_keeps_last() {
        let t = Utc.with_ymd_and_hms(2025, 5, 16, 1, 2, 3).unwrap();
        let map = ActivityMap::build(
            "garmin",
            vec![
                SourceActivity::new("1", "Morning Run", t),
                SourceActivity::new("2", "Evening Run", t),
            ],
            &JoinKeyFormat::default(),
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("2025-05-16 01:02:03").unwrap().id, "2");
    }

    #[test]
    fn serializes_sorted_by_key() {
        let fmt = JoinKeyFormat::default();
        let map = ActivityMap::build(
            "strava",
            vec![
                SourceActivity::new("9", "B", Utc.with_ymd_and_hms(2025, 5, 17, 0, 0, 0).unwrap()),
                SourceActivity::new("8", "A", Utc.with_ymd_and_hms(2025, 5, 16, 0, 0, 0).unwrap()),
            ],
            &fmt,
        );
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(
            json,
            r#"{"2025-05-16 00:00:00":{"id":"8","name":"A"},"2025-05-17 00:00:00":{"id":"9","name":"B"}}"#
        );
    }
}
