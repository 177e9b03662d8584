//! Watermark-driven sync loop.
//!
//! Walks reference-zone days from the watermark's day up to and including
//! `today`, forwarding new non-zero buckets one day at a time.
//!
//! # Invariants
//!
//! - The watermark never decreases, and is persisted exactly once per run
//!   (also when the loop made no progress or hit a fatal error).
//! - A bucket starting at or before the watermark is never forwarded again.
//! - The loop never moves past an incomplete day.
//! - A failed write does not advance the watermark for that day.
//!
//! Stop conditions map to [`StopReason`]; only a failed write and the fatal
//! cases (expired credentials, state IO) are failures for the caller.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use pulse_schemas::{ConfigError, DestinationWriteError, FetchStatus, RefZone, SourceFetchError, StateError};
use tracing::{debug, error, info, warn};

use crate::bucket::{DayBoundary, DayBucket};
use crate::dataset::{DatasetPatch, StreamId};
use crate::watermark::{format_watermark, Watermark};
use crate::{StepDestination, StepSource, WatermarkStore};

// ---------------------------------------------------------------------------
// Params / report
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
pub struct StepSyncParams {
    pub zone: RefZone,
    pub boundary: DayBoundary,
    /// Last day (reference zone) the loop may visit.
    pub today: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayOutcome {
    pub day: NaiveDate,
    pub fetched: usize,
    pub forwarded: usize,
    pub complete: bool,
    /// Set when a patch was written for this day.
    pub dataset_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// Every day up to `today` was complete.
    CaughtUp,
    /// The source has nothing for `day` yet.
    NoData { day: NaiveDate },
    /// `day` is not complete; the next run resumes there.
    DayInProgress { day: NaiveDate },
    /// A non-fatal fetch error; handled like `NoData`.
    FetchFailed { day: NaiveDate, error: String },
    /// The destination refused the day's patch; the watermark was not moved
    /// for it.
    WriteFailed { day: NaiveDate, error: String },
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::CaughtUp => "caught_up",
            StopReason::NoData { .. } => "no_data",
            StopReason::DayInProgress { .. } => "day_in_progress",
            StopReason::FetchFailed { .. } => "fetch_failed",
            StopReason::WriteFailed { .. } => "write_failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, StopReason::WriteFailed { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncReport {
    pub start_watermark: DateTime<Utc>,
    pub final_watermark: DateTime<Utc>,
    pub days: Vec<DayOutcome>,
    pub stop: StopReason,
}

impl SyncReport {
    pub fn records_forwarded(&self) -> usize {
        self.days.iter().map(|d| d.forwarded).sum()
    }

    pub fn days_forwarded(&self) -> usize {
        self.days.iter().filter(|d| d.forwarded > 0).count()
    }

    pub fn is_clean(&self) -> bool {
        !self.stop.is_failure()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncError {
    Config(ConfigError),
    FetchFatal { day: NaiveDate, source: SourceFetchError },
    WriteFatal { day: NaiveDate, source: DestinationWriteError },
    State(StateError),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::Config(e) => write!(f, "{e}"),
            SyncError::FetchFatal { day, source } => {
                write!(f, "SYNC_FETCH_FATAL day={day}: {source}")
            }
            SyncError::WriteFatal { day, source } => {
                write!(f, "SYNC_WRITE_FATAL day={day}: {source}")
            }
            SyncError::State(e) => write!(f, "SYNC_STATE: {e}"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::Config(e) => Some(e),
            SyncError::FetchFatal { source, .. } => Some(source),
            SyncError::WriteFatal { source, .. } => Some(source),
            SyncError::State(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SyncError {
    fn from(e: ConfigError) -> Self {
        SyncError::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Read the stored watermark. Absent or undecodable state is a config error.
pub fn load_watermark(store: &dyn WatermarkStore) -> Result<Watermark, SyncError> {
    match store.read_watermark() {
        Ok(Some(at)) => Ok(Watermark::new(at)),
        Ok(None) => Err(ConfigError::missing("steps watermark").into()),
        Err(StateError::Malformed { path, detail }) => {
            Err(ConfigError::malformed("steps watermark", format!("{path}: {detail}")).into())
        }
        Err(e) => Err(SyncError::State(e)),
    }
}

pub fn run_step_sync(
    params: StepSyncParams,
    start: Watermark,
    store: &mut dyn WatermarkStore,
    source: &dyn StepSource,
    dest: &dyn StepDestination,
    stream: &StreamId,
) -> Result<SyncReport, SyncError> {
    let mut wm = start;
    let mut days = Vec::new();
    let mut day = wm.day(params.zone);

    info!(
        watermark = %format_watermark(wm.at()),
        from_day = %day,
        today = %params.today,
        source = source.service(),
        destination = dest.service(),
        "step sync start"
    );

    let result = sync_days(params, &mut wm, &mut day, &mut days, source, dest, stream);

    // Persist unconditionally, before any error reaches the caller.
    store
        .write_watermark(wm.at())
        .map_err(SyncError::State)?;

    let stop = result?;
    let report = SyncReport {
        start_watermark: start.at(),
        final_watermark: wm.at(),
        days,
        stop,
    };

    info!(
        final_watermark = %format_watermark(report.final_watermark),
        days_forwarded = report.days_forwarded(),
        records_forwarded = report.records_forwarded(),
        stop = report.stop.label(),
        "step sync done"
    );
    Ok(report)
}

fn sync_days(
    params: StepSyncParams,
    wm: &mut Watermark,
    day: &mut NaiveDate,
    days: &mut Vec<DayOutcome>,
    source: &dyn StepSource,
    dest: &dyn StepDestination,
    stream: &StreamId,
) -> Result<StopReason, SyncError> {
    while *day <= params.today {
        let raw = match FetchStatus::classify(source.fetch_day(*day)) {
            FetchStatus::Records(raw) => raw,
            FetchStatus::Done => {
                info!(day = %day, source = source.service(), "no data for day");
                return Ok(StopReason::NoData { day: *day });
            }
            FetchStatus::Retryable(e) => {
                warn!(day = %day, source = e.service(), error = %e, "fetch failed, stopping");
                return Ok(StopReason::FetchFailed {
                    day: *day,
                    error: e.to_string(),
                });
            }
            FetchStatus::Fatal(e) => {
                error!(day = %day, source = e.service(), error = %e, "fatal fetch error");
                return Err(SyncError::FetchFatal { day: *day, source: e });
            }
        };

        let bucket = DayBucket::new(*day, raw);
        let complete = bucket.is_complete(params.zone, params.boundary);
        let forward = bucket.forwardable(wm);
        debug!(
            day = %day,
            fetched = bucket.len(),
            forwardable = forward.len(),
            complete,
            "day fetched"
        );

        let Some(patch) = DatasetPatch::new(stream.clone(), &forward) else {
            days.push(DayOutcome {
                day: *day,
                fetched: bucket.len(),
                forwarded: 0,
                complete,
                dataset_id: None,
            });
            if complete {
                *day = next_day(*day)?;
                continue;
            }
            return Ok(StopReason::DayInProgress { day: *day });
        };

        let dataset_id = patch.dataset_id();
        if let Err(e) = dest.upsert(&patch) {
            if e.is_fatal() {
                error!(day = %day, dataset = %dataset_id, destination = e.service(), error = %e, "fatal write error");
                return Err(SyncError::WriteFatal { day: *day, source: e });
            }
            error!(day = %day, dataset = %dataset_id, destination = e.service(), error = %e, "write failed, stopping");
            return Ok(StopReason::WriteFailed {
                day: *day,
                error: e.to_string(),
            });
        }

        info!(
            day = %day,
            dataset = %dataset_id,
            records = forward.len(),
            complete,
            "day forwarded"
        );
        days.push(DayOutcome {
            day: *day,
            fetched: bucket.len(),
            forwarded: forward.len(),
            complete,
            dataset_id: Some(dataset_id),
        });

        // A complete day is known up to its last bucket. A partial day is
        // only known up to what was actually forwarded.
        let reached = if complete {
            bucket.last_start()
        } else {
            forward.last().and_then(|r| DateTime::from_timestamp_millis(r.start_millis))
        };
        if let Some(t) = reached {
            wm.advance_to(t);
        }

        if !complete {
            return Ok(StopReason::DayInProgress { day: *day });
        }
        *day = next_day(*day)?;
    }
    Ok(StopReason::CaughtUp)
}

fn next_day(day: NaiveDate) -> Result<NaiveDate, SyncError> {
    day.succ_opt()
        .ok_or_else(|| ConfigError::malformed("steps day cursor", format!("{day} has no successor")).into())
}
