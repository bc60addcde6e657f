//! Error types for cursor-pager
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for cursor-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Request Errors
    // ============================================================================
    #[error("Invalid page request: {message}")]
    InvalidPage { message: String },

    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Invalid cursor token: {message}")]
    InvalidCursor { message: String },

    // ============================================================================
    // Collaborator Errors
    // ============================================================================
    #[error("Cursor source error: {message}")]
    Source { message: String },

    #[error("Checkpoint store error: {message}")]
    Store { message: String },

    #[error("DuckDB error: {0}")]
    Database(#[from] duckdb::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an invalid page error
    pub fn invalid_page(message: impl Into<String>) -> Self {
        Self::InvalidPage {
            message: message.into(),
        }
    }

    /// Create an invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(message: impl Into<String>) -> Self {
        Self::InvalidCursor {
            message: message.into(),
        }
    }

    /// Create a cursor source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source {
            message: message.into(),
        }
    }

    /// Create a checkpoint store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Check if this error came from a collaborator rather than the request
    pub fn is_collaborator_failure(&self) -> bool {
        matches!(
            self,
            Error::Source { .. } | Error::Store { .. } | Error::Database(_) | Error::Io(_)
        )
    }
}

/// Result type alias for cursor-pager
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::invalid_page("page number must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid page request: page number must be at least 1"
        );

        let err = Error::store("connection refused");
        assert_eq!(err.to_string(), "Checkpoint store error: connection refused");
    }

    #[test]
    fn test_is_collaborator_failure() {
        assert!(Error::source("boom").is_collaborator_failure());
        assert!(Error::store("boom").is_collaborator_failure());
        assert!(Error::Io(std::io::Error::other("disk")).is_collaborator_failure());

        assert!(!Error::invalid_page("zero").is_collaborator_failure());
        assert!(!Error::config("bad").is_collaborator_failure());
        assert!(!Error::invalid_cursor("garbage").is_collaborator_failure());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::store("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Checkpoint store error: inner"));
    }
}
