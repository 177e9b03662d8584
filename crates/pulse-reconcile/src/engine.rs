use std::fmt;

use pulse_schemas::{DayWindow, DestinationWriteError, FetchStatus, SourceFetchError};
use tracing::{error, info, warn};

use crate::ignore::IgnoreList;
use crate::types::{ActivityMap, JoinKeyFormat};
use crate::{ActivitySource, RenameTarget};

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rename {
    pub key: String,
    pub target_id: String,
    pub from: String,
    pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub renames: Vec<Rename>,
    /// Keys skipped because a name matched an ignore prefix.
    pub ignored: Vec<String>,
    /// Source keys with no counterpart in the target.
    pub unmatched: Vec<String>,
    /// Keys whose names already agree.
    pub in_sync: Vec<String>,
}

/// Decide every rename for two snapshots. Pure; output is in key order.
///
/// A key is ignored when the source name starts with an ignore prefix. The
/// target's current name never blocks a rename.
pub fn plan_renames(source: &ActivityMap, target: &ActivityMap, ignore: &IgnoreList) -> RenamePlan {
    let mut plan = RenamePlan::default();

    for src in source.iter() {
        if let Some(prefix) = ignore.matching_prefix(&src.name) {
            info!(key = %src.key, name = %src.name, prefix, "ignored by source name");
            plan.ignored.push(src.key.clone());
            continue;
        }

        let Some(dst) = target.get(&src.key) else {
            plan.unmatched.push(src.key.clone());
            continue;
        };

        if src.name == dst.name {
            plan.in_sync.push(src.key.clone());
            continue;
        }

        plan.renames.push(Rename {
            key: src.key.clone(),
            target_id: dst.id.clone(),
            from: dst.name.clone(),
            to: src.name.clone(),
        });
    }

    plan
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenameFailure {
    pub key: String,
    pub target_id: String,
    pub error: DestinationWriteError,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub renamed: Vec<String>,
    pub failed: Vec<RenameFailure>,
}

/// One rename call per planned rename. A failure is recorded against its key
/// and the remaining renames still run; only an expired credential aborts.
pub fn apply_renames(
    plan: &RenamePlan,
    target: &dyn RenameTarget,
) -> Result<ReconcileOutcome, ReconcileError> {
    let mut out = ReconcileOutcome::default();

    for r in &plan.renames {
        match target.rename(&r.target_id, &r.to) {
            Ok(()) => {
                info!(
                    key = %r.key,
                    target = target.service(),
                    id = %r.target_id,
                    from = %r.from,
                    to = %r.to,
                    "renamed"
                );
                out.renamed.push(r.key.clone());
            }
            Err(e) if e.is_fatal() => {
                error!(key = %r.key, target = e.service(), error = %e, "fatal rename error");
                return Err(ReconcileError::RenameFatal {
                    key: r.key.clone(),
                    source: e,
                });
            }
            Err(e) => {
                warn!(key = %r.key, target = e.service(), id = %r.target_id, error = %e, "rename failed");
                out.failed.push(RenameFailure {
                    key: r.key.clone(),
                    target_id: r.target_id.clone(),
                    error: e,
                });
            }
        }
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct NameSyncParams {
    pub window: DayWindow,
    pub key_format: JoinKeyFormat,
    /// Plan only; no rename calls are made.
    pub dry_run: bool,
}

/// Why a run ended before planning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    SourceEmpty,
    SourceFetchFailed(String),
    TargetEmpty,
    TargetFetchFailed(String),
}

impl SkipReason {
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::SourceEmpty => "source_empty",
            SkipReason::SourceFetchFailed(_) => "source_fetch_failed",
            SkipReason::TargetEmpty => "target_empty",
            SkipReason::TargetFetchFailed(_) => "target_fetch_failed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameSyncReport {
    pub source: ActivityMap,
    pub target: ActivityMap,
    pub plan: RenamePlan,
    pub outcome: ReconcileOutcome,
    pub skipped: Option<SkipReason>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileError {
    FetchFatal { source: SourceFetchError },
    RenameFatal { key: String, source: DestinationWriteError },
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::FetchFatal { source } => write!(f, "NAMES_FETCH_FATAL: {source}"),
            ReconcileError::RenameFatal { key, source } => {
                write!(f, "NAMES_RENAME_FATAL key={key}: {source}")
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::FetchFatal { source } => Some(source),
            ReconcileError::RenameFatal { source, .. } => Some(source),
        }
    }
}

enum Fetched {
    Map(ActivityMap),
    Skip(SkipReason),
}

fn fetch_map(
    svc: &dyn ActivitySource,
    params: &NameSyncParams,
    empty: SkipReason,
    failed: fn(String) -> SkipReason,
) -> Result<Fetched, ReconcileError> {
    match FetchStatus::classify(svc.fetch_activities(&params.window)) {
        FetchStatus::Records(list) => {
            let map = ActivityMap::build(svc.service(), list, &params.key_format);
            info!(service = svc.service(), activities = map.len(), "activities fetched");
            Ok(Fetched::Map(map))
        }
        FetchStatus::Done => {
            info!(service = svc.service(), "no activities in window");
            Ok(Fetched::Skip(empty))
        }
        FetchStatus::Retryable(e) => {
            warn!(service = e.service(), error = %e, "activity fetch failed");
            Ok(Fetched::Skip(failed(e.to_string())))
        }
        FetchStatus::Fatal(e) => {
            error!(service = e.service(), error = %e, "fatal activity fetch error");
            Err(ReconcileError::FetchFatal { source: e })
        }
    }
}

/// Snapshot the source of truth, then the target, then plan and apply.
///
/// The target is not contacted when the source has nothing (or failed).
pub fn run_name_sync(
    params: &NameSyncParams,
    source: &dyn ActivitySource,
    target_list: &dyn ActivitySource,
    target: &dyn RenameTarget,
    ignore: &IgnoreList,
) -> Result<NameSyncReport, ReconcileError> {
    info!(
        after = %params.window.after().to_rfc3339(),
        before = %params.window.before().to_rfc3339(),
        zone = params.window.zone().name(),
        dry_run = params.dry_run,
        "name sync start"
    );

    let mut report = NameSyncReport::default();

    report.source = match fetch_map(source, params, SkipReason::SourceEmpty, SkipReason::SourceFetchFailed)? {
        Fetched::Map(m) => m,
        Fetched::Skip(reason) => {
            report.skipped = Some(reason);
            return Ok(report);
        }
    };

    report.target = match fetch_map(target_list, params, SkipReason::TargetEmpty, SkipReason::TargetFetchFailed)? {
        Fetched::Map(m) => m,
        Fetched::Skip(reason) => {
            report.skipped = Some(reason);
            return Ok(report);
        }
    };

    report.plan = plan_renames(&report.source, &report.target, ignore);
    info!(
        renames = report.plan.renames.len(),
        ignored = report.plan.ignored.len(),
        unmatched = report.plan.unmatched.len(),
        in_sync = report.plan.in_sync.len(),
        "rename plan"
    );

    if params.dry_run {
        for r in &report.plan.renames {
            info!(key = %r.key, id = %r.target_id, from = %r.from, to = %r.to, "dry run: would rename");
        }
        return Ok(report);
    }

    report.outcome = apply_renames(&report.plan, target)?;
    Ok(report)
}
