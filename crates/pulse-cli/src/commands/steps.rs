//! `pulse steps sync`

use anyhow::{bail, Context, Result};
use chrono::Utc;
use pulse_clients::{GarminClient, GoogleFitClient, GARMIN_BASE_URL, GOOGLE_FIT_BASE_URL};
use pulse_config::secrets::resolve_secrets_for_job;
use pulse_config::JobKind;
use pulse_state::FileStateStore;
use pulse_steps::{
    ensure_stream, format_watermark, load_watermark, parse_watermark, run_step_sync, StepSyncParams,
    Watermark,
};
use tracing::{info, info_span};
use uuid::Uuid;

use super::load_job_config;

pub fn steps_sync(config_paths: Vec<String>, watermark_override: Option<String>) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = info_span!("steps_sync", run_id = %run_id);
    let _enter = span.enter();

    let cfg = load_job_config(&config_paths, JobKind::Steps)?;
    let settings = &cfg.settings;
    info!(config_hash = %cfg.loaded.config_hash, "config loaded");

    let zone = settings.zone()?;
    let boundary = settings.day_boundary()?;
    let mut store = FileStateStore::new(&settings.state.watermark_path, &settings.state.snapshot_path);

    // The watermark is required state: resolve it before any network call.
    let start = match watermark_override.as_deref() {
        Some(raw) => Watermark::new(parse_watermark(raw).context("--watermark")?),
        None => load_watermark(&store)?,
    };

    let secrets = resolve_secrets_for_job(&cfg.loaded.config_json, JobKind::Steps)?;
    let garmin_token = secrets
        .garmin_token
        .context("SECRETS_MISSING job=STEPS: garmin token")?;
    let fit_token = secrets
        .google_fit_token
        .context("SECRETS_MISSING job=STEPS: google fit token")?;

    let source = GarminClient::new(
        settings.garmin.base_url.as_deref().unwrap_or(GARMIN_BASE_URL),
        settings.garmin.display_name.trim(),
        garmin_token,
    );
    let dest = GoogleFitClient::new(
        settings.google_fit.base_url.as_deref().unwrap_or(GOOGLE_FIT_BASE_URL),
        fit_token,
    );

    let stream = ensure_stream(&dest, &settings.stream_descriptor())?;

    let params = StepSyncParams {
        zone,
        boundary,
        today: zone.day_of(Utc::now()),
    };
    let report = run_step_sync(params, start, &mut store, &source, &dest, &stream)?;

    println!("start_watermark={}", format_watermark(report.start_watermark));
    println!("final_watermark={}", format_watermark(report.final_watermark));
    println!("days_forwarded={}", report.days_forwarded());
    println!("records_forwarded={}", report.records_forwarded());
    println!("stop={}", report.stop.label());

    if !report.is_clean() {
        bail!("STEPS_SYNC_FAILED stop={:?}", report.stop);
    }
    Ok(())
}
