use crate::SourceFetchError;

/// Explicit outcome of one source fetch, as consumed by an engine loop.
///
/// Engines never branch on raw `Result`s from a source; they classify first
/// and then match on the four cases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchStatus<T> {
    /// The source returned at least one record.
    Records(Vec<T>),
    /// The source returned nothing: no more data for this unit.
    Done,
    /// The fetch failed but the next invocation may succeed.
    Retryable(SourceFetchError),
    /// The fetch failed in a way that no later unit can recover from.
    Fatal(SourceFetchError),
}

impl<T> FetchStatus<T> {
    pub fn classify(result: Result<Vec<T>, SourceFetchError>) -> Self {
        match result {
            Ok(records) if records.is_empty() => FetchStatus::Done,
            Ok(records) => FetchStatus::Records(records),
            Err(e) if e.is_fatal() => FetchStatus::Fatal(e),
            Err(e) => FetchStatus::Retryable(e),
        }
    }

    pub fn is_records(&self) -> bool {
        matches!(self, FetchStatus::Records(_))
    }
}
