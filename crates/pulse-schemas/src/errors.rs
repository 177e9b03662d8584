use std::fmt;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Required external state is missing or malformed.
///
/// Always fatal, and always raised before any network call is made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing { what: String },
    Malformed { what: String, detail: String },
}

impl ConfigError {
    pub fn missing(what: impl Into<String>) -> Self {
        ConfigError::Missing { what: what.into() }
    }

    pub fn malformed(what: impl Into<String>, detail: impl Into<String>) -> Self {
        ConfigError::Malformed {
            what: what.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing { what } => {
                write!(f, "CONFIG_MISSING: {what} is required but absent")
            }
            ConfigError::Malformed { what, detail } => {
                write!(f, "CONFIG_MALFORMED: {what}: {detail}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// Source fetch
// ---------------------------------------------------------------------------

/// A source could not deliver records for one unit of work.
///
/// Only [`SourceFetchError::AuthExpired`] is fatal; everything else means
/// "no more data for this unit in this run".
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceFetchError {
    AuthExpired { service: &'static str, detail: String },
    RateLimited { service: &'static str, detail: String },
    Transport { service: &'static str, detail: String },
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    Decode { service: &'static str, detail: String },
}

impl SourceFetchError {
    pub fn service(&self) -> &'static str {
        match self {
            SourceFetchError::AuthExpired { service, .. }
            | SourceFetchError::RateLimited { service, .. }
            | SourceFetchError::Transport { service, .. }
            | SourceFetchError::Api { service, .. }
            | SourceFetchError::Decode { service, .. } => service,
        }
    }

    /// The core never re-authenticates, so an expired credential ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceFetchError::AuthExpired { .. })
    }
}

impl fmt::Display for SourceFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFetchError::AuthExpired { service, detail } => {
                write!(f, "{service}: authentication expired: {detail}")
            }
            SourceFetchError::RateLimited { service, detail } => {
                write!(f, "{service}: rate limited: {detail}")
            }
            SourceFetchError::Transport { service, detail } => {
                write!(f, "{service}: transport error: {detail}")
            }
            SourceFetchError::Api {
                service,
                status,
                message,
            } => write!(f, "{service}: api error status={status}: {message}"),
            SourceFetchError::Decode { service, detail } => {
                write!(f, "{service}: decode error: {detail}")
            }
        }
    }
}

impl std::error::Error for SourceFetchError {}

// ---------------------------------------------------------------------------
// Destination write
// ---------------------------------------------------------------------------

/// A destination rejected or failed a write.
///
/// Fatal for the current unit of work only, unless the credential expired.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DestinationWriteError {
    /// The addressed resource does not exist (drives create-or-get).
    NotFound {
        service: &'static str,
        resource: String,
    },
    AuthExpired { service: &'static str, detail: String },
    RateLimited { service: &'static str, detail: String },
    Transport { service: &'static str, detail: String },
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },
    Decode { service: &'static str, detail: String },
    /// The request was never sent because its content is invalid.
    Rejected { service: &'static str, detail: String },
}

impl DestinationWriteError {
    pub fn service(&self) -> &'static str {
        match self {
            DestinationWriteError::NotFound { service, .. }
            | DestinationWriteError::AuthExpired { service, .. }
            | DestinationWriteError::RateLimited { service, .. }
            | DestinationWriteError::Transport { service, .. }
            | DestinationWriteError::Api { service, .. }
            | DestinationWriteError::Decode { service, .. }
            | DestinationWriteError::Rejected { service, .. } => service,
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, DestinationWriteError::AuthExpired { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DestinationWriteError::NotFound { .. })
    }
}

impl fmt::Display for DestinationWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationWriteError::NotFound { service, resource } => {
                write!(f, "{service}: not found: {resource}")
            }
            DestinationWriteError::AuthExpired { service, detail } => {
                write!(f, "{service}: authentication expired: {detail}")
            }
            DestinationWriteError::RateLimited { service, detail } => {
                write!(f, "{service}: rate limited: {detail}")
            }
            DestinationWriteError::Transport { service, detail } => {
                write!(f, "{service}: transport error: {detail}")
            }
            DestinationWriteError::Api {
                service,
                status,
                message,
            } => write!(f, "{service}: api error status={status}: {message}"),
            DestinationWriteError::Decode { service, detail } => {
                write!(f, "{service}: decode error: {detail}")
            }
            DestinationWriteError::Rejected { service, detail } => {
                write!(f, "{service}: request rejected before send: {detail}")
            }
        }
    }
}

impl std::error::Error for DestinationWriteError {}

// ---------------------------------------------------------------------------
// Persisted state
// ---------------------------------------------------------------------------

/// Reading or writing externally persisted state failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    Io { path: String, detail: String },
    /// The file exists but its content cannot be decoded.
    Malformed { path: String, detail: String },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Io { path, detail } => write!(f, "state io error at '{path}': {detail}"),
            StateError::Malformed { path, detail } => {
                write!(f, "state at '{path}' is malformed: {detail}")
            }
        }
    }
}

impl std::error::Error for StateError {}

// ---------------------------------------------------------------------------
// HTTP status hints
// ---------------------------------------------------------------------------

/// Operator-facing explanation for common upstream HTTP statuses.
pub fn status_hint(status: u16) -> &'static str {
    match status {
        400 => "endpoint not available (400 Bad Request); the feature may not be enabled for this account",
        401 => "authentication required (401 Unauthorized); refresh the access token",
        403 => "access denied (403 Forbidden); the account may lack permission",
        404 => "endpoint not found (404); the resource may have moved or been removed",
        429 => "rate limit exceeded (429); wait before making more requests",
        500 => "server error (500); the service is experiencing issues",
        503 => "service unavailable (503); the service is temporarily down",
        _ => "unexpected http status",
    }
}
