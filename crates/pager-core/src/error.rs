//! Error types for the pager.
//!
//! Fetch failures are published into the cache's `error` cell rather than
//! returned; the remaining variants surface as `Err` from the operation that
//! hit them.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the pager library.
#[derive(Debug, Error)]
pub enum PagerError {
    // Fetch errors
    #[error("Fetch failed: {message}")]
    Fetch { message: String },

    #[error("Request aborted")]
    Aborted,

    // Usage errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Cache configuration changed after first use: {field}")]
    ConfigChanged { field: &'static str },

    // Storage errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for pager operations.
pub type Result<T> = std::result::Result<T, PagerError>;

impl From<std::io::Error> for PagerError {
    fn from(err: std::io::Error) -> Self {
        PagerError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for PagerError {
    fn from(err: serde_json::Error) -> Self {
        PagerError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for PagerError {
    fn from(err: rusqlite::Error) -> Self {
        PagerError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl PagerError {
    /// Create a fetch error from any displayable cause.
    pub fn fetch(message: impl Into<String>) -> Self {
        PagerError::Fetch {
            message: message.into(),
        }
    }

    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PagerError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Check if this error came from an explicit abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, PagerError::Aborted)
    }

    /// Check if retrying the same load could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PagerError::Fetch { .. } | PagerError::Aborted)
    }
}
