//! Webhook notifier: POSTs `{"content": text}` to the URL routed for the
//! recipient.

use std::collections::BTreeMap;
use std::fmt;

use pulse_index::{Notifier, NotifyError};
use reqwest::blocking::Client;
use serde_json::json;

use crate::http::client;

#[derive(Clone)]
pub struct WebhookNotifier {
    routes: BTreeMap<String, String>,
    http: Client,
}

// Webhook URLs embed their credential, so only recipients are shown.
impl fmt::Debug for WebhookNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookNotifier")
            .field("recipients", &self.routes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl WebhookNotifier {
    pub fn new(routes: BTreeMap<String, String>) -> Self {
        Self {
            routes,
            http: client(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn send(&self, recipient: &str, text: &str) -> Result<(), NotifyError> {
        let url = self
            .routes
            .get(recipient)
            .ok_or_else(|| NotifyError::UnknownRecipient(recipient.to_string()))?;
        let resp = self
            .http
            .post(url)
            .json(&json!({ "content": text }))
            .send()
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message: resp.text().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn posts_content_to_routed_url() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/hooks/ops")
                .json_body(json!({"content": "Index updated"}));
            then.status(204);
        });

        let mut routes = BTreeMap::new();
        routes.insert("ops".to_string(), server.url("/hooks/ops"));
        let n = WebhookNotifier::new(routes);
        n.send("ops", "Index updated").unwrap();
        m.assert();

        assert_eq!(
            n.send("finance", "x").unwrap_err(),
            NotifyError::UnknownRecipient("finance".to_string())
        );
    }

    #[test]
    fn non_success_is_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST);
            then.status(400).body("bad payload");
        });
        let mut routes = BTreeMap::new();
        routes.insert("ops".to_string(), server.url("/hook"));
        let err = WebhookNotifier::new(routes).send("ops", "x").unwrap_err();
        assert_eq!(
            err,
            NotifyError::Rejected {
                status: 400,
                message: "bad payload".to_string()
            }
        );
    }
}
