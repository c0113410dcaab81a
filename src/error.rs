//! Unified error handling for the trendsift crate
//!
//! A single [`Error`] enum wraps the domain-specific failure modes so that
//! callers can propagate with `?` across module boundaries while keeping the
//! original error detail.
//!
//! The pipeline makes one distinction callers must be able to rely on:
//! an analysis run that finds nothing returns an empty report, never an
//! error; a run that cannot persist its results returns an error, never a
//! quiet success.

use std::io;
use thiserror::Error;

pub use crate::collect::CollectError;

/// Unified error type for the trendsift crate
#[derive(Error, Debug)]
pub enum Error {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[source] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Collection errors (per-source; the fan-out isolates these)
    #[error("Collect error: {0}")]
    Collect(#[from] CollectError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Check if this error is recoverable (worth retrying next cycle)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Database(_) => false,
            Self::Io(_) => true,
            Self::Json(_) => false,
            Self::Collect(e) => e.is_recoverable(),
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = Error::config("missing category map");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("missing category map"));
    }

    #[test]
    fn test_collect_error_conversion() {
        let err: Error = CollectError::Unavailable {
            source: crate::models::Source::Twitter,
            reason: "no bearer token".to_string(),
        }
        .into();
        assert!(matches!(err, Error::Collect(_)));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_recoverable() {
        let err = Error::from(io::Error::new(io::ErrorKind::TimedOut, "timeout"));
        assert!(err.is_recoverable());
    }
}
