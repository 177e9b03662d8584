//! `pulse index check`

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pulse_clients::WebhookNotifier;
use pulse_config::secrets::resolve_secrets_for_job;
use pulse_config::JobKind;
use pulse_index::{read_index_csv, render_summary, run_index_check, LogNotifier, Notifier};
use pulse_state::FileStateStore;
use tracing::{info, info_span};
use uuid::Uuid;

use super::load_job_config;

pub fn index_check(config_paths: Vec<String>, csv: String, summary_out: Option<String>) -> Result<()> {
    let run_id = Uuid::new_v4();
    let span = info_span!("index_check", run_id = %run_id);
    let _enter = span.enter();

    let cfg = load_job_config(&config_paths, JobKind::Index)?;
    let settings = &cfg.settings;
    info!(config_hash = %cfg.loaded.config_hash, "config loaded");

    let current = read_index_csv(Path::new(&csv))?;
    info!(date = %current.date, signal = %current.signal, score = current.score, "latest index row");

    let secrets = resolve_secrets_for_job(&cfg.loaded.config_json, JobKind::Index)?;
    let webhook = WebhookNotifier::new(secrets.webhooks.clone());
    let notifier: &dyn Notifier = if webhook.is_empty() {
        &LogNotifier
    } else {
        &webhook
    };
    info!(notifier = notifier.name(), "notifier selected");

    let mut store = FileStateStore::new(&settings.state.watermark_path, &settings.state.snapshot_path);
    let report = run_index_check(
        current,
        &mut store,
        notifier,
        settings.index.recipient.trim(),
    )?;

    if let Some(path) = summary_out.as_deref() {
        append_summary(Path::new(path), &render_summary(&report.current))?;
    }

    println!("changed={}", report.changed());
    println!(
        "trend={}",
        report.event.as_ref().map(|e| e.trend.label()).unwrap_or("none")
    );
    Ok(())
}

fn append_summary(path: &Path, text: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open summary-out failed: {}", path.display()))?;
    f.write_all(text.as_bytes())
        .with_context(|| format!("write summary-out failed: {}", path.display()))?;
    Ok(())
}
