//! scenario_file_state_survives_restart
//!
//! The same engine runs against `FileStateStore` in a temp dir.
//!
//! GREEN when:
//! - the watermark file holds the RFC 3339 UTC instant after a run
//! - a fresh store over the same file resumes from it and forwards nothing new
//! - a sub-second watermark is written back with its fraction, never earlier
//! - a missing watermark file is reported as missing config
//! - the index snapshot round-trips through the JSON file

use chrono::{NaiveDate, TimeZone, Utc};
use pulse_index::{run_index_check, IndexSnapshot};
use pulse_schemas::RefZone;
use pulse_state::FileStateStore;
use pulse_steps::{load_watermark, run_step_sync, DayBoundary, StepSyncParams, StreamId, SyncError, WatermarkStore};
use pulse_testkit::{day_buckets, RecordingNotifier, RecordingStepDestination, ScriptedStepSource};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

#[test]
fn watermark_file_is_resumed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let wm_path = dir.path().join("state").join("steps_watermark.txt");
    let snap_path = dir.path().join("state").join("index_snapshot.json");

    let zone = RefZone::default();
    let stream = StreamId::new("derived:test");
    let params = StepSyncParams {
        zone,
        boundary: DayBoundary::default(),
        today: d(17),
    };
    let source = ScriptedStepSource::new()
        .with_day(d(15), day_buckets(d(15), zone, 96, |_| 0))
        .with_day(d(16), day_buckets(d(16), zone, 96, |i| if i % 10 == 0 { 100 } else { 0 }));
    let dest = RecordingStepDestination::new().with_stream(stream.clone());

    let mut store = FileStateStore::new(&wm_path, &snap_path);
    let err = load_watermark(&store).unwrap_err();
    assert!(matches!(err, SyncError::Config(_)));
    assert!(err.to_string().contains("CONFIG_MISSING"));

    store.write_watermark(Utc.with_ymd_and_hms(2025, 5, 15, 15, 45, 0).unwrap())?;
    let start = load_watermark(&store)?;
    let report = run_step_sync(params, start, &mut store, &source, &dest, &stream)?;
    assert_eq!(report.records_forwarded(), 10);

    let text = std::fs::read_to_string(&wm_path)?;
    assert_eq!(text, "2025-05-16T15:45:00Z\n");

    let mut reopened = FileStateStore::new(&wm_path, &snap_path);
    let resumed = load_watermark(&reopened)?;
    assert_eq!(resumed.at(), report.final_watermark);
    let again = run_step_sync(params, resumed, &mut reopened, &source, &dest, &stream)?;
    assert_eq!(again.records_forwarded(), 0);
    assert_eq!(dest.upsert_count(), 1);
    Ok(())
}

#[test]
fn fractional_watermark_is_not_truncated() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let wm_path = dir.path().join("wm.txt");
    let mut store = FileStateStore::new(&wm_path, dir.path().join("snap.json"));

    let w0 = Utc.with_ymd_and_hms(2025, 5, 15, 15, 45, 0).unwrap() + chrono::Duration::milliseconds(500);
    store.write_watermark(w0)?;

    let stream = StreamId::new("derived:test");
    let params = StepSyncParams {
        zone: RefZone::default(),
        boundary: DayBoundary::default(),
        today: d(17),
    };
    let source = ScriptedStepSource::new();
    let dest = RecordingStepDestination::new().with_stream(stream.clone());

    let start = load_watermark(&store)?;
    let report = run_step_sync(params, start, &mut store, &source, &dest, &stream)?;
    assert_eq!(report.records_forwarded(), 0);
    assert_eq!(report.final_watermark, w0);

    assert_eq!(std::fs::read_to_string(&wm_path)?, "2025-05-15T15:45:00.500Z\n");
    let persisted = load_watermark(&FileStateStore::new(&wm_path, dir.path().join("snap.json")))?;
    assert_eq!(persisted.at(), w0);
    Ok(())
}

#[test]
fn snapshot_file_round_trips() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut store = FileStateStore::new(dir.path().join("wm.txt"), dir.path().join("snap.json"));
    let notifier = RecordingNotifier::new();
    let current = IndexSnapshot {
        date: "2025-04".to_string(),
        signal: "green".to_string(),
        score: 23,
    };

    assert!(run_index_check(current.clone(), &mut store, &notifier, "ops")?.changed());
    assert!(!run_index_check(current.clone(), &mut store, &notifier, "ops")?.changed());

    let json = std::fs::read_to_string(dir.path().join("snap.json"))?;
    assert!(json.contains("\"latest_signal_score\":23"));

    std::fs::write(dir.path().join("snap.json"), "{not json")?;
    let report = run_index_check(current, &mut store, &notifier, "ops")?;
    assert!(report.changed(), "corrupt snapshot counts as absent");
    assert_eq!(notifier.sent().len(), 2);
    Ok(())
}
