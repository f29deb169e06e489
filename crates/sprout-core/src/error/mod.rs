//! Error types and result aliases for sprout operations.
//!
//! Provides a unified error type covering all error conditions across the
//! sprout crates with actionable error messages.

use thiserror::Error;

use crate::types::SourceKind;

/// Unified error type for all sprout operations
#[derive(Error, Debug)]
pub enum SproutError {
    // Specifier errors
    #[error("Invalid package specifier '{spec}': {reason}")]
    SpecParse { spec: String, reason: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("No version of '{name}' satisfies '{range}'")]
    NoMatchingVersion { name: String, range: String },

    #[error("Resource not found: {url}")]
    NotFound { url: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // Fetcher errors
    #[error("Git operation failed: {message}")]
    Git { message: String },

    #[error("Integrity check failed for {package}: expected {expected}, got {actual}")]
    IntegrityFailure {
        package: String,
        expected: String,
        actual: String,
    },

    #[error("The {fetcher} fetcher cannot handle a {source} source")]
    SourceMismatch {
        fetcher: SourceKind,
        source: SourceKind,
    },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for sprout operations
pub type SproutResult<T> = Result<T, SproutError>;

impl SproutError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error may succeed on retry
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SproutError::Network { .. } | SproutError::Io { .. })
    }
}
