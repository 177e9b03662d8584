//! `pulse names sync`

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use pulse_clients::{GarminClient, StravaClient, GARMIN_BASE_URL, STRAVA_BASE_URL};
use pulse_config::secrets::resolve_secrets_for_job;
use pulse_config::JobKind;
use pulse_reconcile::{run_name_sync, IgnoreList, NameSyncParams};
use pulse_schemas::DayWindow;
use pulse_state::{init_run_audit, load_ignore_list, write_json_audit};
use tracing::{info, info_span};
use uuid::Uuid;

use super::load_job_config;

pub fn names_sync(config_paths: Vec<String>, dry_run: bool) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = info_span!("names_sync", run_id = %run_id);
    let _enter = span.enter();

    let cfg = load_job_config(&config_paths, JobKind::Names)?;
    let settings = &cfg.settings;
    info!(config_hash = %cfg.loaded.config_hash, "config loaded");

    let ignore = match settings.names.ignore_path.as_deref() {
        Some(p) => load_ignore_list(Path::new(p))?,
        None => IgnoreList::default(),
    };
    info!(prefixes = ignore.prefixes().len(), "ignore list loaded");

    let params = NameSyncParams {
        window: DayWindow::trailing(Utc::now(), settings.names.lookback_days, settings.zone()?),
        key_format: settings.key_format()?,
        dry_run,
    };

    let secrets = resolve_secrets_for_job(&cfg.loaded.config_json, JobKind::Names)?;
    let garmin_token = secrets
        .garmin_token
        .context("SECRETS_MISSING job=NAMES: garmin token")?;
    let strava_token = secrets
        .strava_token
        .context("SECRETS_MISSING job=NAMES: strava token")?;

    let garmin = GarminClient::new(
        settings.garmin.base_url.as_deref().unwrap_or(GARMIN_BASE_URL),
        settings.garmin.display_name.trim(),
        garmin_token,
    );
    let strava = StravaClient::new(
        settings.strava.base_url.as_deref().unwrap_or(STRAVA_BASE_URL),
        strava_token,
    );

    let report = run_name_sync(&params, &garmin, &strava, &strava, &ignore)?;

    if let Some(dir) = settings.state.audit_dir.as_deref() {
        let audit = init_run_audit(Path::new(dir), run_id, "names", &cfg.loaded.config_hash)?;
        write_json_audit(&audit.run_dir, "garmin_activities.json", &report.source)?;
        write_json_audit(&audit.run_dir, "strava_activities.json", &report.target)?;
        info!(dir = %audit.run_dir.display(), "audit written");
    }

    if let Some(reason) = &report.skipped {
        println!("skipped={}", reason.label());
    }
    println!("renamed={}", report.outcome.renamed.len());
    println!("failed={}", report.outcome.failed.len());
    println!("ignored={}", report.plan.ignored.len());
    println!("unmatched={}", report.plan.unmatched.len());

    if !report.outcome.failed.is_empty() {
        let keys: Vec<&str> = report.outcome.failed.iter().map(|f| f.key.as_str()).collect();
        bail!("NAMES_RENAME_FAILED keys={:?}", keys);
    }
    Ok(())
}
