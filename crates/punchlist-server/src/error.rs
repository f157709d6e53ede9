//! Error types for the punchlist HTTP server.

use thiserror::Error;

/// Errors that can occur in the punchlist server.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file could not be loaded or parsed.
    #[error("configuration error in {path}: {reason}")]
    Config {
        /// The config file path.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// An error from the punchlist core.
    #[error("core error: {0}")]
    Core(#[from] punchlist::error::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for punchlist server operations.
pub type Result<T> = std::result::Result<T, Error>;
