//! pulse-clients
//!
//! Blocking HTTP adapters for the external services. Each adapter implements
//! the capability traits of the core crates and maps HTTP statuses onto the
//! shared error taxonomy (401 → auth expired, 429 → rate limited, 404 → not
//! found on write paths, anything else → api error with an operator hint).
//!
//! Tokens are passed in by the caller (CLI) and never logged.

mod garmin;
mod google_fit;
mod http;
mod strava;
mod webhook;

pub use garmin::{GarminClient, GARMIN_BASE_URL};
pub use google_fit::{GoogleFitClient, GOOGLE_FIT_BASE_URL};
pub use strava::{StravaClient, STRAVA_BASE_URL};
pub use webhook::WebhookNotifier;
