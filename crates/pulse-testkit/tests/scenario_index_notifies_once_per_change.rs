//! scenario_index_notifies_once_per_change
//!
//! GREEN when:
//! - the first observed snapshot notifies once with trend "none"
//! - an identical snapshot on the next run sends nothing and writes nothing
//! - a higher / lower score reports trend up / down
//! - a failed notification leaves the stored snapshot untouched, and the next
//!   run sends the same change again
//! - a corrupt stored snapshot is treated as absent and overwritten

use pulse_index::{run_index_check, IndexError, IndexSnapshot, NotifyError, Trend};
use pulse_testkit::{MemorySnapshotStore, RecordingNotifier};

fn snap(date: &str, signal: &str, score: i64) -> IndexSnapshot {
    IndexSnapshot {
        date: date.to_string(),
        signal: signal.to_string(),
        score,
    }
}

#[test]
fn unchanged_snapshot_is_a_no_op() {
    let mut store = MemorySnapshotStore::new(None);
    let notifier = RecordingNotifier::new();
    let current = snap("2025-04", "green", 23);

    let first = run_index_check(current.clone(), &mut store, &notifier, "ops").unwrap();
    assert!(first.changed());
    assert_eq!(first.event.as_ref().map(|e| e.trend), Some(Trend::None));
    assert_eq!(store.snapshot(), Some(&current));

    let second = run_index_check(current.clone(), &mut store, &notifier, "ops").unwrap();
    assert!(!second.changed());
    assert_eq!(second.previous, Some(current));

    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(notifier.sent()[0].0, "ops");
    assert_eq!(store.writes(), 1);
}

#[test]
fn trend_follows_score() {
    let mut store = MemorySnapshotStore::new(Some(snap("2025-03", "yellow-blue", 20)));
    let notifier = RecordingNotifier::new();

    let up = run_index_check(snap("2025-04", "green", 23), &mut store, &notifier, "ops").unwrap();
    assert_eq!(up.event.unwrap().trend, Trend::Up);

    let down = run_index_check(snap("2025-05", "blue", 15), &mut store, &notifier, "ops").unwrap();
    assert_eq!(down.event.unwrap().trend, Trend::Down);

    // Same score, different signal: still a change, no direction.
    let flat = run_index_check(snap("2025-05", "yellow-blue", 15), &mut store, &notifier, "ops").unwrap();
    assert_eq!(flat.event.unwrap().trend, Trend::None);

    let texts: Vec<String> = notifier.sent().into_iter().map(|(_, t)| t).collect();
    assert_eq!(texts.len(), 3);
    assert!(texts[0].contains("date=2025-04"));
    assert!(texts[0].contains("trend=up"));
    assert!(texts[1].contains("trend=down"));
}

#[test]
fn failed_notification_is_retried_next_run() {
    let previous = snap("2025-03", "yellow-blue", 20);
    let mut store = MemorySnapshotStore::new(Some(previous.clone()));
    let notifier = RecordingNotifier::new();
    notifier.fail_next(NotifyError::Rejected {
        status: 502,
        message: "bad gateway".to_string(),
    });

    let current = snap("2025-04", "green", 23);
    let err = run_index_check(current.clone(), &mut store, &notifier, "ops").unwrap_err();
    assert!(matches!(err, IndexError::Notify(_)));
    assert!(err.to_string().starts_with("INDEX_NOTIFY_FAILED"));
    assert_eq!(store.snapshot(), Some(&previous), "not persisted on failure");
    assert_eq!(store.writes(), 0);

    let retry = run_index_check(current.clone(), &mut store, &notifier, "ops").unwrap();
    assert!(retry.changed());
    assert_eq!(retry.previous, Some(previous));
    assert_eq!(notifier.sent().len(), 1);
    assert_eq!(store.snapshot(), Some(&current));
}

#[test]
fn corrupt_snapshot_is_overwritten() {
    let mut store = MemorySnapshotStore::malformed();
    let notifier = RecordingNotifier::new();

    let report = run_index_check(snap("2025-04", "green", 23), &mut store, &notifier, "ops").unwrap();

    assert!(report.changed());
    assert_eq!(report.previous, None);
    assert_eq!(store.writes(), 1);
    assert!(notifier.sent()[0].1.contains("no previous value"));
}
