//! scenario_secrets_job_enforcement
//!
//! Validates the per-job fail-closed behavior of `resolve_secrets_for_job`.
//!
//! # Test design
//! Failure tests point at sentinel env var names (`PULSE_SENTINEL_*`) that are
//! never set anywhere, so no test mutates the process environment.
//!
//! # Coverage
//! 1. STEPS fails when the Garmin token is missing
//! 2. STEPS fails when the Google Fit token is missing
//! 3. NAMES fails when the Strava token is missing
//! 4. INDEX needs no secrets; unset webhook vars are simply absent
//! 5. Errors name the variable, never a value
//! 6. `Debug` output is redacted

use pulse_config::load_layered_yaml_from_strings;
use pulse_config::secrets::{resolve_secrets_for_job, ResolvedSecrets};
use pulse_config::JobKind;
use std::collections::BTreeMap;

fn load(yaml: &str) -> serde_json::Value {
    load_layered_yaml_from_strings(&[yaml])
        .expect("test yaml must parse cleanly")
        .config_json
}

#[test]
fn steps_fails_when_garmin_token_missing() {
    let cfg = load(
        r#"
secrets_env:
  garmin_token: "PULSE_SENTINEL_GARMIN_MISSING_A1"
  google_fit_token: "PULSE_SENTINEL_FIT_MISSING_A1"
"#,
    );
    let msg = resolve_secrets_for_job(&cfg, JobKind::Steps)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("SECRETS_MISSING"), "{msg}");
    assert!(msg.contains("job=STEPS"), "{msg}");
    assert!(msg.contains("PULSE_SENTINEL_GARMIN_MISSING_A1"), "{msg}");
}

#[test]
fn steps_fails_when_google_fit_token_missing() {
    // PATH is set in every environment, so the Garmin check passes and the
    // Google Fit sentinel is the first failure.
    let cfg = load(
        r#"
secrets_env:
  garmin_token: "PATH"
  google_fit_token: "PULSE_SENTINEL_FIT_MISSING_B2"
"#,
    );
    let msg = resolve_secrets_for_job(&cfg, JobKind::Steps)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("PULSE_SENTINEL_FIT_MISSING_B2"), "{msg}");
}

#[test]
fn names_fails_when_strava_token_missing() {
    let cfg = load(
        r#"
secrets_env:
  garmin_token: "PATH"
  strava_token: "PULSE_SENTINEL_STRAVA_MISSING_C3"
"#,
    );
    let msg = resolve_secrets_for_job(&cfg, JobKind::Names)
        .unwrap_err()
        .to_string();
    assert!(msg.contains("job=NAMES"), "{msg}");
    assert!(msg.contains("PULSE_SENTINEL_STRAVA_MISSING_C3"), "{msg}");
}

#[test]
fn index_needs_no_secrets() {
    let cfg = load(
        r#"
secrets_env:
  garmin_token: "PULSE_SENTINEL_GARMIN_MISSING_D4"
notify:
  webhooks:
    ops: "PULSE_SENTINEL_WEBHOOK_MISSING_D4"
"#,
    );
    let secrets = resolve_secrets_for_job(&cfg, JobKind::Index).unwrap();
    assert!(secrets.garmin_token.is_none());
    assert!(secrets.webhooks.is_empty(), "unset webhook var must be absent");
}

#[test]
fn debug_output_is_redacted() {
    let mut webhooks = BTreeMap::new();
    webhooks.insert("ops".to_string(), "https://hooks.example/very-secret".to_string());
    let secrets = ResolvedSecrets {
        garmin_token: Some("garmin-secret-value".to_string()),
        google_fit_token: None,
        strava_token: Some("strava-secret-value".to_string()),
        webhooks,
    };
    let dbg = format!("{secrets:?}");
    assert!(dbg.contains("<REDACTED>"), "{dbg}");
    assert!(dbg.contains("ops"), "{dbg}");
    assert!(!dbg.contains("garmin-secret-value"), "{dbg}");
    assert!(!dbg.contains("strava-secret-value"), "{dbg}");
    assert!(!dbg.contains("very-secret"), "{dbg}");
}
