//! Domain error types
//!
//! Validation failures raised when constructing domain newtypes.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Memo identifier is empty or malformed
    #[error("Invalid memo ID: {0}")]
    InvalidMemoId(String),

    /// Date key could not be parsed as `YYYY-MM-DD`
    #[error("Invalid date key: {0}")]
    InvalidDateKey(String),

    /// Resume marker is neither RFC 3339 nor unix seconds
    #[error("Invalid resume marker: {0}")]
    InvalidResumeMarker(String),

    /// Unsupported Memos API version string
    #[error("Unknown API version '{0}'; valid options: v0.19.1, v0.22.0, v0.24.0")]
    UnknownApiVersion(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
