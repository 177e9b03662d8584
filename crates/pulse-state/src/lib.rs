//! pulse-state
//!
//! File-backed state shared between runs:
//! - `watermark.txt`: one RFC 3339 timestamp
//! - snapshot JSON: `{latest_date, latest_signal, latest_signal_score}`
//! - ignore list: one literal prefix per line
//! - per-run audit directories (see [`audit`])
//!
//! Writes go to a sibling temp file which is then renamed over the target.

pub mod audit;

pub use audit::{init_run_audit, write_json_audit, RunAudit, RunManifest};

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use pulse_index::{IndexSnapshot, SnapshotStore};
use pulse_reconcile::IgnoreList;
use pulse_schemas::{ConfigError, StateError};
use pulse_steps::{format_watermark, parse_watermark, WatermarkStore};
use tracing::debug;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Clone, Debug)]
pub struct FileStateStore {
    watermark_path: PathBuf,
    snapshot_path: PathBuf,
}

impl FileStateStore {
    pub fn new(watermark_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            watermark_path: watermark_path.into(),
            snapshot_path: snapshot_path.into(),
        }
    }

    pub fn watermark_path(&self) -> &Path {
        &self.watermark_path
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }
}

impl WatermarkStore for FileStateStore {
    fn read_watermark(&self) -> Result<Option<DateTime<Utc>>, StateError> {
        let Some(text) = read_optional(&self.watermark_path)? else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(None);
        }
        parse_watermark(&text)
            .map(Some)
            .map_err(|e| malformed(&self.watermark_path, e))
    }

    fn write_watermark(&mut self, at: DateTime<Utc>) -> Result<(), StateError> {
        write_atomic(&self.watermark_path, &format!("{}\n", format_watermark(at)))
    }
}

impl SnapshotStore for FileStateStore {
    fn read_snapshot(&self) -> Result<Option<IndexSnapshot>, StateError> {
        let Some(text) = read_optional(&self.snapshot_path)? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| malformed(&self.snapshot_path, e))
    }

    fn write_snapshot(&mut self, snapshot: &IndexSnapshot) -> Result<(), StateError> {
        let json = serde_json::to_string(snapshot).map_err(|e| malformed(&self.snapshot_path, e))?;
        write_atomic(&self.snapshot_path, &format!("{json}\n"))
    }
}

/// Load the rename ignore list. The file must exist once configured.
pub fn load_ignore_list(path: &Path) -> Result<IgnoreList, ConfigError> {
    let what = format!("ignore list '{}'", path.display());
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(ConfigError::missing(what)),
        Err(e) => return Err(ConfigError::malformed(what, e.to_string())),
    };
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(&text);
    let list = IgnoreList::from_lines(text.lines());
    debug!(path = %path.display(), prefixes = list.prefixes().len(), "ignore list loaded");
    Ok(list)
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn read_optional(path: &Path) -> Result<Option<String>, StateError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text.strip_prefix(UTF8_BOM).unwrap_or(&text).to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io(path, e)),
    }
}

pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, contents).map_err(|e| io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io(path, e))
}

fn io(path: &Path, e: impl std::fmt::Display) -> StateError {
    StateError::Io {
        path: path.display().to_string(),
        detail: e.to_string(),
    }
}

fn malformed(path: &Path, e: impl std::fmt::Display) -> StateError {
    StateError::Malformed {
        path: path.display().to_string(),
        detail: e.to_string(),
    }
}
