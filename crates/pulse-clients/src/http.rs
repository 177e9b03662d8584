//! Shared request plumbing: client construction, URL building and the
//! HTTP status → error taxonomy mapping.

use std::time::Duration;

use pulse_schemas::{status_hint, DestinationWriteError, SourceFetchError};
use reqwest::blocking::{Client, Response};
use reqwest::Url;

const TIMEOUT: Duration = Duration::from_secs(30);
const BODY_EXCERPT: usize = 200;

pub(crate) fn client() -> Client {
    Client::builder()
        .timeout(TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// `base` joined with percent-encoded path `segments`.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(base).map_err(|e| format!("invalid base url '{base}': {e}"))?;
    url.path_segments_mut()
        .map_err(|_| format!("base url '{base}' cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(BODY_EXCERPT) {
        Some((i, _)) => format!("{}…", &trimmed[..i]),
        None => trimmed.to_string(),
    }
}

fn describe(status: u16, body: &str) -> String {
    let body = excerpt(body);
    if body.is_empty() {
        status_hint(status).to_string()
    } else {
        format!("{}: {body}", status_hint(status))
    }
}

/// Non-2xx response from a read endpoint.
pub(crate) fn source_error(service: &'static str, resp: Response) -> SourceFetchError {
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    match status {
        401 => SourceFetchError::AuthExpired {
            service,
            detail: describe(status, &body),
        },
        429 => SourceFetchError::RateLimited {
            service,
            detail: describe(status, &body),
        },
        _ => SourceFetchError::Api {
            service,
            status,
            message: describe(status, &body),
        },
    }
}

/// Non-2xx response from a write (or create-or-get lookup) endpoint.
pub(crate) fn destination_error(
    service: &'static str,
    resource: &str,
    resp: Response,
) -> DestinationWriteError {
    let status = resp.status().as_u16();
    let body = resp.text().unwrap_or_default();
    match status {
        404 => DestinationWriteError::NotFound {
            service,
            resource: resource.to_string(),
        },
        401 => DestinationWriteError::AuthExpired {
            service,
            detail: describe(status, &body),
        },
        429 => DestinationWriteError::RateLimited {
            service,
            detail: describe(status, &body),
        },
        _ => DestinationWriteError::Api {
            service,
            status,
            message: describe(status, &body),
        },
    }
}
