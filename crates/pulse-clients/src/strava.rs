//! Strava adapter: athlete activity list and activity rename.

use std::fmt;

use chrono::{DateTime, Utc};
use pulse_reconcile::{ActivitySource, RenameTarget, SourceActivity};
use pulse_schemas::{DayWindow, DestinationWriteError, SourceFetchError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::http::{client, destination_error, endpoint, source_error};

pub const STRAVA_BASE_URL: &str = "https://www.strava.com/api/v3";
const SERVICE: &str = "strava";
const PER_PAGE: usize = 200;

#[derive(Clone)]
pub struct StravaClient {
    base_url: String,
    token: String,
    http: Client,
}

impl fmt::Debug for StravaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StravaClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct StravaActivity {
    id: serde_json::Value,
    #[serde(default)]
    name: String,
    start_date: String,
}

impl StravaClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: client(),
        }
    }

    fn fetch_page(
        &self,
        window: &DayWindow,
        page: usize,
    ) -> Result<Vec<StravaActivity>, SourceFetchError> {
        let url = endpoint(&self.base_url, &["athlete", "activities"]).map_err(|detail| {
            SourceFetchError::Transport {
                service: SERVICE,
                detail,
            }
        })?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[
                ("after", window.after().timestamp().to_string()),
                ("before", window.before().timestamp().to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ])
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

impl ActivitySource for StravaClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn fetch_activities(&self, window: &DayWindow) -> Result<Vec<SourceActivity>, SourceFetchError> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.fetch_page(window, page)?;
            let n = batch.len();
            for a in batch {
                let Ok(start) = DateTime::parse_from_rfc3339(&a.start_date) else {
                    warn!(service = SERVICE, start = %a.start_date, "skipping activity with unparsable start");
                    continue;
                };
                let id = match &a.id {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push(SourceActivity::new(id, a.name, start.with_timezone(&Utc)));
            }
            if n < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(out)
    }
}

impl RenameTarget for StravaClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn rename(&self, id: &str, new_name: &str) -> Result<(), DestinationWriteError> {
        let url = endpoint(&self.base_url, &["activities", id]).map_err(|detail| {
            DestinationWriteError::Rejected {
                service: SERVICE,
                detail,
            }
        })?;
        let resp = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .json(&json!({ "name": new_name }))
            .send()
            .map_err(|e| DestinationWriteError::Transport {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(destination_error(SERVICE, id, resp));
        }
        Ok(())
    }
}
