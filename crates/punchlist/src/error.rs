//! Error types for punchlist operations.

use crate::domain::IssueId;
use std::io;
use thiserror::Error;

/// The error type for issue store operations.
///
/// The first four variants form the caller-recoverable taxonomy surfaced to
/// API clients; the remaining variants are internal faults and must never
/// reach a client verbatim.
#[derive(Debug, Error)]
pub enum Error {
    /// One of the required creation fields is missing or empty.
    #[error("required field(s) missing")]
    MissingRequiredFields,

    /// No identifier was supplied to an update or delete.
    #[error("missing _id")]
    MissingId,

    /// Update was called with nothing to change.
    ///
    /// Carries the identifier back to the caller. This error takes
    /// precedence over [`Error::IssueNotFound`]: an update with no fields
    /// reports "no update fields" even when the id does not exist.
    #[error("no update field(s) sent")]
    NoUpdateFields {
        /// The identifier the caller supplied.
        id: IssueId,
    },

    /// No record with this identifier in the addressed project.
    #[error("issue not found: {id}")]
    IssueNotFound {
        /// The identifier that was looked up.
        id: IssueId,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for punchlist operations.
pub type Result<T> = std::result::Result<T, Error>;
