//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"GARMIN_ACCESS_TOKEN"`).
//! - Callers invoke [`resolve_secrets_for_job`] once at startup and pass the
//!   result into client constructors. No other code reads the environment.
//! - `Debug` output redacts every value.
//! - Errors name the missing env var, never a value.
//!
//! | Job   | Required                         |
//! |-------|----------------------------------|
//! | STEPS | Garmin token, Google Fit token   |
//! | NAMES | Garmin token, Strava token       |
//! | INDEX | nothing (webhooks are optional)  |

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::JobKind;

const DEFAULT_GARMIN_VAR: &str = "GARMIN_ACCESS_TOKEN";
const DEFAULT_GOOGLE_FIT_VAR: &str = "GOOGLE_FIT_ACCESS_TOKEN";
const DEFAULT_STRAVA_VAR: &str = "STRAVA_ACCESS_TOKEN";

#[derive(Clone)]
pub struct ResolvedSecrets {
    pub garmin_token: Option<String>,
    pub google_fit_token: Option<String>,
    pub strava_token: Option<String>,
    /// Webhook URL per notification recipient. Recipients whose env var is
    /// unset are absent.
    pub webhooks: BTreeMap<String, String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let webhooks: BTreeMap<&str, &str> = self
            .webhooks
            .keys()
            .map(|k| (k.as_str(), "<REDACTED>"))
            .collect();
        f.debug_struct("ResolvedSecrets")
            .field("garmin_token", &self.garmin_token.as_ref().map(|_| "<REDACTED>"))
            .field("google_fit_token", &self.google_fit_token.as_ref().map(|_| "<REDACTED>"))
            .field("strava_token", &self.strava_token.as_ref().map(|_| "<REDACTED>"))
            .field("webhooks", &webhooks)
            .finish()
    }
}

struct SecretEnvNames {
    garmin_var: String,
    google_fit_var: String,
    strava_var: String,
    webhook_vars: BTreeMap<String, String>,
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    let webhook_vars = config_json
        .pointer("/notify/webhooks")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(recipient, v)| {
                    let name = v.as_str()?.trim();
                    (!name.is_empty()).then(|| (recipient.clone(), name.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    SecretEnvNames {
        garmin_var: read_str_at(config_json, "/secrets_env/garmin_token")
            .unwrap_or_else(|| DEFAULT_GARMIN_VAR.to_string()),
        google_fit_var: read_str_at(config_json, "/secrets_env/google_fit_token")
            .unwrap_or_else(|| DEFAULT_GOOGLE_FIT_VAR.to_string()),
        strava_var: read_str_at(config_json, "/secrets_env/strava_token")
            .unwrap_or_else(|| DEFAULT_STRAVA_VAR.to_string()),
        webhook_vars,
    }
}

fn require(job: JobKind, value: &Option<String>, var: &str, what: &str) -> Result<()> {
    if value.is_none() {
        bail!(
            "SECRETS_MISSING job={}: required env var '{}' ({}) is not set or empty",
            job.as_str(),
            var,
            what,
        );
    }
    Ok(())
}

/// Resolve all secrets `job` may use, failing on the first required one
/// that is missing.
pub fn resolve_secrets_for_job(config_json: &Value, job: JobKind) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let garmin_token = resolve_env(&names.garmin_var);
    let google_fit_token = resolve_env(&names.google_fit_var);
    let strava_token = resolve_env(&names.strava_var);

    match job {
        JobKind::Steps => {
            require(job, &garmin_token, &names.garmin_var, "Garmin access token")?;
            require(job, &google_fit_token, &names.google_fit_var, "Google Fit access token")?;
        }
        JobKind::Names => {
            require(job, &garmin_token, &names.garmin_var, "Garmin access token")?;
            require(job, &strava_token, &names.strava_var, "Strava access token")?;
        }
        JobKind::Index => {}
    }

    let webhooks = names
        .webhook_vars
        .iter()
        .filter_map(|(recipient, var)| resolve_env(var).map(|url| (recipient.clone(), url)))
        .collect();

    Ok(ResolvedSecrets {
        garmin_token,
        google_fit_token,
        strava_token,
        webhooks,
    })
}
