//! Error taxonomy for the retrieval core.
//!
//! Callers distinguish exactly two outcomes at the query boundary:
//! [`QueryError::NotFound`] (the requested artifact or device/date has no
//! data) and [`QueryError::Internal`] (everything else — storage
//! connectivity, timeouts, corrupt archives). Row-level decode failures are
//! not errors at all; the decoder drops bad rows silently.

use thiserror::Error;

/// Errors from the object-storage collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The object does not exist. Also covers the benign race where an
    /// object vanishes between an existence check and its fetch.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The request exceeded the configured timeout.
    #[error("storage request timed out: {0}")]
    Timeout(String),

    /// Any other backend failure (connectivity, auth, unexpected status).
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from the tiered artifact locator.
#[derive(Debug, Error)]
pub enum LocateError {
    /// Neither the hot object nor the cold archive exists.
    #[error("{0} file not exists.")]
    ArchiveMissing(String),

    /// The cold archive exists but holds no entry for the requested date.
    #[error("Data for requested device={device}, sensor={sensor} and date={date} not found")]
    EntryMissing {
        device: String,
        sensor: String,
        date: String,
    },

    /// The archive could not be opened or an entry could not be read.
    #[error("archive error: {0}")]
    Archive(String),

    /// Underlying storage failure other than a miss.
    #[error(transparent)]
    Storage(StorageError),
}

/// Errors surfaced by the query orchestrator to the endpoint layer.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No data exists for the request. Safe to show to API callers.
    #[error("{0}")]
    NotFound(String),

    /// Anything else. The message may reference backend internals and
    /// should not be assumed safe for end users verbatim.
    #[error("{0}")]
    Internal(String),
}

impl From<LocateError> for QueryError {
    fn from(err: LocateError) -> Self {
        match err {
            LocateError::ArchiveMissing(_) | LocateError::EntryMissing { .. } => {
                QueryError::NotFound(err.to_string())
            }
            LocateError::Storage(StorageError::NotFound(key)) => {
                QueryError::NotFound(format!("object not found: {}", key))
            }
            other => QueryError::Internal(other.to_string()),
        }
    }
}

impl From<StorageError> for QueryError {
    fn from(err: StorageError) -> Self {
        QueryError::Internal(err.to_string())
    }
}
