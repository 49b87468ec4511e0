//! Error types for Wayfinder.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application. Domain crates define narrower error types for their own
//! failure modes and convert into `AppError` at crate boundaries.

use thiserror::Error;

/// Unified error type for Wayfinder.
///
/// Failures are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job queue storage errors
    #[error("Queue error: {0}")]
    Queue(String),

    /// Web search provider and secret store errors
    #[error("Search error: {0}")]
    Search(String),

    /// Source routing and context resolution errors
    #[error("Context error: {0}")]
    Context(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_category() {
        let err = AppError::Queue("database is locked".to_string());
        assert_eq!(err.to_string(), "Queue error: database is locked");
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
