//! Typed settings deserialized from the merged config JSON.
//!
//! Every field has a default so a minimal YAML works. Validation is per job:
//! a names-only deployment does not need a Google Fit stream identity.

use anyhow::{bail, Context, Result};
use chrono::format::{Item, StrftimeItems};
use pulse_reconcile::{JoinKeyFormat, DEFAULT_KEY_FORMAT};
use pulse_schemas::RefZone;
use pulse_steps::{DayBoundary, StreamDescriptor};
use serde::Deserialize;
use serde_json::Value;

use crate::JobKind;

const DEFAULT_TIMEZONE: &str = "Asia/Taipei";
const DEFAULT_BUCKET_MINUTES: u32 = 15;
const DEFAULT_LOOKBACK_DAYS: u32 = 7;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PulseSettings {
    pub timezone: String,
    pub state: StateSettings,
    pub garmin: GarminSettings,
    pub google_fit: GoogleFitSettings,
    pub strava: StravaSettings,
    pub steps: StepsSettings,
    pub names: NamesSettings,
    pub index: IndexSettings,
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            state: StateSettings::default(),
            garmin: GarminSettings::default(),
            google_fit: GoogleFitSettings::default(),
            strava: StravaSettings::default(),
            steps: StepsSettings::default(),
            names: NamesSettings::default(),
            index: IndexSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateSettings {
    pub watermark_path: String,
    pub snapshot_path: String,
    /// Per-run JSON dumps land under this directory when set.
    pub audit_dir: Option<String>,
}

impl Default for StateSettings {
    fn default() -> Self {
        Self {
            watermark_path: "state/steps_watermark.txt".to_string(),
            snapshot_path: "state/index_snapshot.json".to_string(),
            audit_dir: None,
        }
    }
}

/// `base_url: None` means the adapter's production endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GarminSettings {
    pub base_url: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleFitSettings {
    pub base_url: Option<String>,
    pub stream: StreamSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StreamSettings {
    pub project_number: String,
    pub manufacturer: String,
    pub model: String,
    pub uid_suffix: String,
    pub stream_name: String,
    pub application_name: String,
    pub application_version: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            project_number: String::new(),
            manufacturer: "Garmin".to_string(),
            model: "Connect".to_string(),
            uid_suffix: "1".to_string(),
            stream_name: "garmin-steps".to_string(),
            application_name: "pulse".to_string(),
            application_version: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StravaSettings {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StepsSettings {
    pub bucket_minutes: u32,
}

impl Default for StepsSettings {
    fn default() -> Self {
        Self {
            bucket_minutes: DEFAULT_BUCKET_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamesSettings {
    pub lookback_days: u32,
    pub key_format: String,
    pub ignore_path: Option<String>,
}

impl Default for NamesSettings {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            key_format: DEFAULT_KEY_FORMAT.to_string(),
            ignore_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub recipient: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            recipient: "default".to_string(),
        }
    }
}

impl PulseSettings {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: settings do not match the expected shape")
    }

    /// Check everything `job` will read. The first problem wins.
    pub fn validate_for(&self, job: JobKind) -> Result<()> {
        match job {
            JobKind::Steps => {
                self.zone()?;
                self.day_boundary()?;
                non_empty("state.watermark_path", &self.state.watermark_path)?;
                non_empty("garmin.display_name", &self.garmin.display_name)?;
                let s = &self.google_fit.stream;
                non_empty("google_fit.stream.project_number", &s.project_number)?;
                non_empty("google_fit.stream.manufacturer", &s.manufacturer)?;
                non_empty("google_fit.stream.model", &s.model)?;
                non_empty("google_fit.stream.uid_suffix", &s.uid_suffix)?;
                non_empty("google_fit.stream.stream_name", &s.stream_name)?;
            }
            JobKind::Names => {
                self.zone()?;
                non_empty("garmin.display_name", &self.garmin.display_name)?;
                if self.names.lookback_days == 0 {
                    bail!("CONFIG_INVALID: names.lookback_days must be > 0");
                }
                self.key_format()?;
            }
            JobKind::Index => {
                non_empty("state.snapshot_path", &self.state.snapshot_path)?;
                non_empty("index.recipient", &self.index.recipient)?;
            }
        }
        Ok(())
    }

    pub fn zone(&self) -> Result<RefZone> {
        RefZone::parse(&self.timezone).map_err(|e| anyhow::anyhow!("CONFIG_INVALID: {e}"))
    }

    pub fn day_boundary(&self) -> Result<DayBoundary> {
        DayBoundary::from_bucket_minutes(self.steps.bucket_minutes)
            .map_err(|e| anyhow::anyhow!("CONFIG_INVALID: {e}"))
    }

    /// Rejects patterns chrono cannot render; formatting one would panic.
    pub fn key_format(&self) -> Result<JoinKeyFormat> {
        let pattern = self.names.key_format.trim();
        if pattern.is_empty() {
            bail!("CONFIG_INVALID: names.key_format is empty");
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            bail!("CONFIG_INVALID: names.key_format '{pattern}' is not a valid strftime pattern");
        }
        Ok(JoinKeyFormat::new(pattern))
    }

    pub fn stream_descriptor(&self) -> StreamDescriptor {
        let s = &self.google_fit.stream;
        StreamDescriptor {
            project_number: s.project_number.trim().to_string(),
            manufacturer: s.manufacturer.trim().to_string(),
            model: s.model.trim().to_string(),
            uid_suffix: s.uid_suffix.trim().to_string(),
            stream_name: s.stream_name.trim().to_string(),
            application_name: s.application_name.trim().to_string(),
            application_version: s.application_version.trim().to_string(),
        }
    }
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("CONFIG_INVALID: {field} must be set");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_fill_missing_sections() {
        let s = PulseSettings::from_json(&json!({})).unwrap();
        assert_eq!(s.timezone, "Asia/Taipei");
        assert_eq!(s.steps.bucket_minutes, 15);
        assert_eq!(s.names.lookback_days, 7);
        assert_eq!(s.names.key_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(s.day_boundary().unwrap(), DayBoundary::default());
        assert!(s.garmin.base_url.is_none());
    }

    #[test]
    fn steps_requires_stream_identity() {
        let s = PulseSettings::from_json(&json!({"garmin": {"display_name": "runner"}})).unwrap();
        let err = s.validate_for(JobKind::Steps).unwrap_err().to_string();
        assert!(err.contains("google_fit.stream.project_number"), "{err}");

        let s = PulseSettings::from_json(&json!({
            "garmin": {"display_name": "runner"},
            "google_fit": {"stream": {"project_number": "123456789012"}}
        }))
        .unwrap();
        s.validate_for(JobKind::Steps).unwrap();
        assert!(s.stream_descriptor().stream_id().as_str().starts_with(
            "derived:com.google.step_count.delta:123456789012:Garmin:Connect:vdev-1:"
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let s = PulseSettings::from_json(&json!({"timezone": "Mars/Olympus"})).unwrap();
        assert!(s.zone().unwrap_err().to_string().contains("CONFIG_INVALID"));

        let s = PulseSettings::from_json(&json!({"steps": {"bucket_minutes": 7}})).unwrap();
        assert!(s.day_boundary().is_err());

        let s = PulseSettings::from_json(&json!({
            "garmin": {"display_name": "runner"},
            "names": {"lookback_days": 0}
        }))
        .unwrap();
        let err = s.validate_for(JobKind::Names).unwrap_err().to_string();
        assert!(err.contains("lookback_days"), "{err}");

        let s = PulseSettings::from_json(&json!({"names": {"key_format": "%Y-%Q"}})).unwrap();
        assert!(s.key_format().is_err());
    }

    #[test]
    fn index_needs_only_recipient_and_snapshot() {
        let s = PulseSettings::from_json(&json!({"timezone": "not/a/zone"})).unwrap();
        s.validate_for(JobKind::Index).unwrap();
    }

    #[test]
    fn wrong_types_fail_with_config_invalid() {
        let err = PulseSettings::from_json(&json!({"steps": {"bucket_minutes": "fifteen"}}))
            .unwrap_err()
            .to_string();
        assert!(err.contains("CONFIG_INVALID"), "{err}");
    }
}
