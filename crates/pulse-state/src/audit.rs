//! Per-run audit directories.
//!
//! `<audit_root>/<run_id>/manifest.json` plus any number of pretty JSON dumps
//! written by the job (e.g. the activity maps of a name sync).

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: Uuid,
    pub job: String,
    pub config_hash: String,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RunAudit {
    pub run_dir: PathBuf,
    pub manifest_path: PathBuf,
}

pub fn init_run_audit(audit_root: &Path, run_id: Uuid, job: &str, config_hash: &str) -> Result<RunAudit> {
    let run_dir = audit_root.join(run_id.to_string());
    fs::create_dir_all(&run_dir)
        .with_context(|| format!("create audit dir failed: {}", run_dir.display()))?;

    let manifest = RunManifest {
        schema_version: 1,
        run_id,
        job: job.to_string(),
        config_hash: config_hash.to_string(),
        created_at_utc: Utc::now(),
    };
    let manifest_path = write_json_audit(&run_dir, "manifest.json", &manifest)?;

    Ok(RunAudit {
        run_dir,
        manifest_path,
    })
}

/// Write `value` as pretty JSON to `dir/name`, replacing any previous file.
pub fn write_json_audit<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {name} failed"))?;
    crate::write_atomic(&path, &format!("{json}\n"))
        .with_context(|| format!("write audit failed: {}", path.display()))?;
    Ok(path)
}
