//! Garmin Connect adapter: daily step buckets and the activity list.
//!
//! The bearer token is issued elsewhere; this client never logs it.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use pulse_reconcile::{ActivitySource, SourceActivity};
use pulse_schemas::{DayWindow, SourceFetchError};
use pulse_steps::{ActivityRecord, StepSource};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::http::{client, endpoint, source_error};

pub const GARMIN_BASE_URL: &str = "https://connectapi.garmin.com";
const SERVICE: &str = "garmin";
const BUCKET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const ACTIVITY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct GarminClient {
    base_url: String,
    display_name: String,
    token: String,
    http: Client,
}

impl fmt::Debug for GarminClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GarminClient")
            .field("base_url", &self.base_url)
            .field("display_name", &self.display_name)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepBucket {
    #[serde(rename = "startGMT")]
    start_gmt: String,
    #[serde(rename = "endGMT")]
    end_gmt: String,
    #[serde(default)]
    steps: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GarminActivity {
    activity_id: serde_json::Value,
    #[serde(default)]
    activity_name: Option<String>,
    #[serde(rename = "startTimeGMT")]
    start_time_gmt: String,
}

impl GarminClient {
    pub fn new(base_url: impl Into<String>, display_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            display_name: display_name.into(),
            token: token.into(),
            http: client(),
        }
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, SourceFetchError> {
        let url = endpoint(&self.base_url, segments).map_err(|detail| SourceFetchError::Transport {
            service: SERVICE,
            detail,
        })?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .map_err(|e| SourceFetchError::Transport {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(source_error(SERVICE, resp));
        }
        resp.json().map_err(|e| SourceFetchError::Decode {
            service: SERVICE,
            detail: e.to_string(),
        })
    }
}

fn parse_gmt(s: &str, fmt: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), fmt)
        .ok()
        .map(|n| Utc.from_utc_datetime(&n))
}

impl StepSource for GarminClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn fetch_day(&self, day: NaiveDate) -> Result<Vec<ActivityRecord>, SourceFetchError> {
        let date = day.format("%Y-%m-%d").to_string();
        // The endpoint answers `null` for days it has never seen.
        let buckets: Option<Vec<StepBucket>> = self.get_json(
            &["wellness-service", "wellness", "dailySummaryChart", &self.display_name],
            &[("date", date.clone())],
        )?;

        let mut out = Vec::new();
        for b in buckets.unwrap_or_default() {
            let (Some(start), Some(end)) = (
                parse_gmt(&b.start_gmt, BUCKET_TIME_FORMAT),
                parse_gmt(&b.end_gmt, BUCKET_TIME_FORMAT),
            ) else {
                warn!(service = SERVICE, day = %date, start = %b.start_gmt, "skipping bucket with unparsable time");
                continue;
            };
            match ActivityRecord::new(start, end, b.steps) {
                Ok(r) => out.push(r),
                Err(e) => warn!(service = SERVICE, day = %date, error = %e, "skipping invalid bucket"),
            }
        }
        debug!(service = SERVICE, day = %date, buckets = out.len(), "steps fetched");
        Ok(out)
    }
}

impl ActivitySource for GarminClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn fetch_activities(&self, window: &DayWindow) -> Result<Vec<SourceActivity>, SourceFetchError> {
        let Some(last_day) = window.last_day() else {
            return Ok(Vec::new());
        };
        let start_date = window.first_day.format("%Y-%m-%d").to_string();
        let end_date = last_day.format("%Y-%m-%d").to_string();

        let mut out = Vec::new();
        let mut offset = 0usize;
        loop {
            let page: Vec<GarminActivity> = self.get_json(
                &["activitylist-service", "activities", "search", "activities"],
                &[
                    ("startDate", start_date.clone()),
                    ("endDate", end_date.clone()),
                    ("start", offset.to_string()),
                    ("limit", PAGE_SIZE.to_string()),
                ],
            )?;
            let n = page.len();
            for a in page {
                let Some(start) = parse_gmt(&a.start_time_gmt, ACTIVITY_TIME_FORMAT) else {
                    warn!(service = SERVICE, start = %a.start_time_gmt, "skipping activity with unparsable start");
                    continue;
                };
                if !window.contains(start) {
                    continue;
                }
                let id = match &a.activity_id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push(SourceActivity::new(id, a.activity_name.unwrap_or_default(), start));
            }
            if n < PAGE_SIZE {
                break;
            }
            offset += n;
        }
        Ok(out)
    }
}
