//! Command handler modules for pulse-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod index;
pub mod names;
pub mod steps;

use anyhow::Result;
use pulse_config::{report_unused_keys, JobKind, LoadedConfig, PulseSettings, UnusedKeyPolicy};
use tracing::warn;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub struct JobConfig {
    pub loaded: LoadedConfig,
    pub settings: PulseSettings,
}

/// Load layered YAML, warn about keys `job` never reads, then build and
/// validate the typed settings.
pub fn load_job_config(config_paths: &[String], job: JobKind) -> Result<JobConfig> {
    let path_refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let loaded = pulse_config::load_layered_yaml(&path_refs)?;

    let report = report_unused_keys(job, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    if !report.is_clean() {
        warn!(
            job = job.as_str(),
            unused_leaf_keys = report.unused_leaf_pointers.len(),
            "CONFIG_UNUSED_KEYS"
        );
        for p in report.unused_leaf_pointers.iter().take(50) {
            warn!(unused = %p, "unused config key");
        }
    }

    let settings = PulseSettings::from_json(&loaded.config_json)?;
    settings.validate_for(job)?;

    Ok(JobConfig { loaded, settings })
}
