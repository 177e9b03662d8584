//! scenario_names_rename_failure_isolated
//!
//! GREEN when:
//! - one failing rename is reported against its key while the others succeed
//! - an expired target credential aborts the remaining renames
//! - a failed or empty source fetch ends the run without contacting the target
//! - an expired source credential is an error, not a skip

use chrono::{DateTime, TimeZone, Utc};
use pulse_reconcile::{
    run_name_sync, IgnoreList, JoinKeyFormat, NameSyncParams, ReconcileError, SkipReason,
};
use pulse_schemas::{DayWindow, DestinationWriteError, RefZone, SourceFetchError};
use pulse_testkit::FakeActivityService;

fn at(day: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, h, 0, 0).unwrap()
}

fn params() -> NameSyncParams {
    NameSyncParams {
        window: DayWindow::trailing(at(20, 4), 7, RefZone::default()),
        key_format: JoinKeyFormat::default(),
        dry_run: false,
    }
}

fn garmin() -> FakeActivityService {
    FakeActivityService::new("garmin")
        .with_activity("g1", "Run A", at(15, 1))
        .with_activity("g2", "Run B", at(16, 1))
        .with_activity("g3", "Run C", at(17, 1))
}

fn strava() -> FakeActivityService {
    FakeActivityService::new("strava")
        .with_activity("s1", "Morning Run", at(15, 1))
        .with_activity("s2", "Morning Run", at(16, 1))
        .with_activity("s3", "Morning Run", at(17, 1))
}

#[test]
fn one_failed_rename_does_not_block_the_rest() {
    let garmin = garmin();
    let strava = strava().failing_rename(
        "s2",
        DestinationWriteError::Api {
            service: "strava",
            status: 500,
            message: "internal".to_string(),
        },
    );

    let report = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap();

    assert_eq!(
        report.outcome.renamed,
        vec!["2025-05-15 01:00:00".to_string(), "2025-05-17 01:00:00".to_string()]
    );
    assert_eq!(report.outcome.failed.len(), 1);
    assert_eq!(report.outcome.failed[0].key, "2025-05-16 01:00:00");
    assert_eq!(report.outcome.failed[0].target_id, "s2");
    assert_eq!(strava.name_of("s2").as_deref(), Some("Morning Run"));
    assert_eq!(strava.name_of("s3").as_deref(), Some("Run C"));
}

#[test]
fn expired_target_credential_aborts() {
    let garmin = garmin();
    let strava = strava().failing_rename(
        "s1",
        DestinationWriteError::AuthExpired {
            service: "strava",
            detail: "401".to_string(),
        },
    );

    let err = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap_err();

    match &err {
        ReconcileError::RenameFatal { key, .. } => assert_eq!(key, "2025-05-15 01:00:00"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("NAMES_RENAME_FATAL"));
    assert!(strava.renames().is_empty(), "no rename after the fatal one");
}

#[test]
fn failed_source_fetch_skips_target() {
    let garmin = garmin().failing_fetch(SourceFetchError::Transport {
        service: "garmin",
        detail: "connection reset".to_string(),
    });
    let strava = strava();

    let report = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap();

    assert_eq!(report.skipped.as_ref().map(SkipReason::label), Some("source_fetch_failed"));
    assert_eq!(strava.fetch_count(), 0);
    assert!(strava.renames().is_empty());
}

#[test]
fn empty_source_skips_target() {
    let garmin = FakeActivityService::new("garmin").with_activity("g0", "Too Old", at(1, 1));
    let strava = strava();

    let report = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap();

    assert_eq!(report.skipped, Some(SkipReason::SourceEmpty));
    assert_eq!(strava.fetch_count(), 0);
}

#[test]
fn empty_target_is_a_skip() {
    let garmin = garmin();
    let strava = FakeActivityService::new("strava");

    let report = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap();

    assert_eq!(report.skipped, Some(SkipReason::TargetEmpty));
    assert_eq!(report.source.len(), 3);
    assert!(report.plan.renames.is_empty());
}

#[test]
fn expired_source_credential_is_an_error() {
    let garmin = garmin().failing_fetch(SourceFetchError::AuthExpired {
        service: "garmin",
        detail: "session expired".to_string(),
    });
    let strava = strava();

    let err = run_name_sync(&params(), &garmin, &strava, &strava, &IgnoreList::default()).unwrap_err();

    assert!(matches!(err, ReconcileError::FetchFatal { .. }));
    assert_eq!(strava.fetch_count(), 0);
}
