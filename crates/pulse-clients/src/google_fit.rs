//! Google Fit adapter: derived data source get/create and dataset patch.

use std::fmt;

use pulse_schemas::DestinationWriteError;
use pulse_steps::{DatasetPatch, StepDestination, StreamDescriptor, StreamId, STEP_COUNT_DATA_TYPE};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::http::{client, destination_error, endpoint};

pub const GOOGLE_FIT_BASE_URL: &str = "https://www.googleapis.com/fitness/v1";
const SERVICE: &str = "google_fit";
const DETAILS_URL: &str = "http://example.com";
const DEVICE_VERSION: &str = "1.0";

#[derive(Clone)]
pub struct GoogleFitClient {
    base_url: String,
    token: String,
    http: Client,
}

impl fmt::Debug for GoogleFitClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleFitClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DataSource {
    data_stream_id: Option<String>,
}

impl GoogleFitClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            http: client(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url, DestinationWriteError> {
        endpoint(&self.base_url, segments).map_err(|detail| DestinationWriteError::Rejected {
            service: SERVICE,
            detail,
        })
    }

    fn send(&self, req: RequestBuilder, resource: &str) -> Result<Value, DestinationWriteError> {
        let resp = req
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| DestinationWriteError::Transport {
                service: SERVICE,
                detail: e.to_string(),
            })?;
        if !resp.status().is_success() {
            return Err(destination_error(SERVICE, resource, resp));
        }
        let text = resp.text().map_err(|e| DestinationWriteError::Decode {
            service: SERVICE,
            detail: e.to_string(),
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| DestinationWriteError::Decode {
            service: SERVICE,
            detail: e.to_string(),
        })
    }

    fn stream_from(body: Value, fallback: StreamId) -> StreamId {
        serde_json::from_value::<DataSource>(body)
            .ok()
            .and_then(|d| d.data_stream_id)
            .map(StreamId::new)
            .unwrap_or(fallback)
    }
}

pub(crate) fn data_source_body(d: &StreamDescriptor) -> Value {
    json!({
        "dataStreamName": d.stream_name,
        "type": "derived",
        "application": {
            "detailsUrl": DETAILS_URL,
            "name": d.application_name,
            "version": d.application_version,
        },
        "dataType": { "name": STEP_COUNT_DATA_TYPE },
        "device": {
            "manufacturer": d.manufacturer,
            "model": d.model,
            "type": "unknown",
            "uid": d.device_uid(),
            "version": DEVICE_VERSION,
        },
        "dataStreamId": d.stream_id().as_str(),
    })
}

/// Nanosecond fields are strings on the wire.
pub(crate) fn dataset_body(patch: &DatasetPatch) -> Value {
    let stream = patch.stream().as_str();
    let points: Vec<Value> = patch
        .points()
        .iter()
        .map(|p| {
            json!({
                "dataTypeName": STEP_COUNT_DATA_TYPE,
                "startTimeNanos": p.start_nanos.to_string(),
                "endTimeNanos": p.end_nanos.to_string(),
                "value": [{ "intVal": p.value }],
                "originDataSourceId": stream,
            })
        })
        .collect();
    json!({
        "dataSourceId": stream,
        "minStartTimeNs": patch.min_start_nanos().to_string(),
        "maxEndTimeNs": patch.max_end_nanos().to_string(),
        "point": points,
    })
}

impl StepDestination for GoogleFitClient {
    fn service(&self) -> &'static str {
        SERVICE
    }

    fn get_stream(&self, id: &StreamId) -> Result<StreamId, DestinationWriteError> {
        let url = self.url(&["users", "me", "dataSources", id.as_str()])?;
        let body = self.send(self.http.get(url), id.as_str())?;
        Ok(Self::stream_from(body, id.clone()))
    }

    fn create_stream(&self, descriptor: &StreamDescriptor) -> Result<StreamId, DestinationWriteError> {
        let id = descriptor.stream_id();
        let url = self.url(&["users", "me", "dataSources"])?;
        let body = self.send(self.http.post(url).json(&data_source_body(descriptor)), id.as_str())?;
        Ok(Self::stream_from(body, id))
    }

    fn upsert(&self, patch: &DatasetPatch) -> Result<(), DestinationWriteError> {
        let dataset_id = patch.dataset_id();
        let url = self.url(&[
            "users",
            "me",
            "dataSources",
            patch.stream().as_str(),
            "datasets",
            &dataset_id,
        ])?;
        self.send(self.http.patch(url).json(&dataset_body(patch)), &dataset_id)?;
        debug!(service = SERVICE, dataset = %dataset_id, points = patch.points().len(), "dataset patched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use pulse_steps::{ensure_stream, ForwardRecord};

    fn descriptor() -> StreamDescriptor {
        StreamDescriptor {
            project_number: "453184793678".to_string(),
            manufacturer: "EDJY".to_string(),
            model: "StepsSyncer".to_string(),
            uid_suffix: "steps".to_string(),
            stream_name: "StepsSyncer".to_string(),
            application_name: "Steps Syncer".to_string(),
            application_version: "1.0".to_string(),
        }
    }

    const STREAM: &str =
        "derived:com.google.step_count.delta:453184793678:EDJY:StepsSyncer:vdev-steps:StepsSyncer";

    #[test]
    fn ensure_stream_creates_on_404() {
        let server = MockServer::start();
        let get = server.mock(|when, then| {
            when.method(GET).path(format!("/users/me/dataSources/{STREAM}"));
            then.status(404).json_body(json!({"error": {"code": 404}}));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/users/me/dataSources")
                .header("authorization", "Bearer tok")
                .json_body_partial(
                    r#"{"type": "derived", "device": {"uid": "vdev-steps", "type": "unknown"}}"#,
                );
            then.status(200).json_body(json!({"dataStreamId": STREAM}));
        });

        let c = GoogleFitClient::new(server.base_url(), "tok");
        let id = ensure_stream(&c, &descriptor()).unwrap();
        get.assert();
        create.assert();
        assert_eq!(id.as_str(), STREAM);
    }

    #[test]
    fn ensure_stream_reuses_existing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path(format!("/users/me/dataSources/{STREAM}"));
            then.status(200).json_body(json!({"dataStreamId": STREAM}));
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/users/me/dataSources");
            then.status(200);
        });
        let c = GoogleFitClient::new(server.base_url(), "tok");
        ensure_stream(&c, &descriptor()).unwrap();
        create.assert_hits(0);
    }

    #[test]
    fn upsert_patches_dataset_keyed_by_range() {
        let recs = [
            ForwardRecord { start_millis: 1_747_325_700_000, end_millis: 1_747_326_600_000, value: 12 },
            ForwardRecord { start_millis: 1_747_328_400_000, end_millis: 1_747_329_300_000, value: 40 },
        ];
        let patch = DatasetPatch::new(StreamId::new(STREAM), &recs).unwrap();
        let dataset_id = patch.dataset_id();

        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method("PATCH")
                .path(format!("/users/me/dataSources/{STREAM}/datasets/{dataset_id}"))
                .json_body(dataset_body(&patch));
            then.status(200).json_body(json!({}));
        });

        let c = GoogleFitClient::new(server.base_url(), "tok");
        c.upsert(&patch).unwrap();
        c.upsert(&patch).unwrap();
        m.assert_hits(2);

        let body = dataset_body(&patch);
        assert_eq!(body["minStartTimeNs"], "1747325700000000000");
        assert_eq!(body["point"][1]["value"][0]["intVal"], 40);
    }

    #[test]
    fn write_errors_are_classified() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("PATCH");
            then.status(500).body("backend");
        });
        let recs = [ForwardRecord { start_millis: 1, end_millis: 2, value: 3 }];
        let patch = DatasetPatch::new(StreamId::new(STREAM), &recs).unwrap();
        let c = GoogleFitClient::new(server.base_url(), "tok");
        let e = c.upsert(&patch).unwrap_err();
        assert!(!e.is_fatal());
        assert!(matches!(e, DestinationWriteError::Api { status: 500, .. }));
    }
}
