//! Error types for Magnet knowledge sync.
//!
//! This module defines a unified error enum that covers all error categories
//! in the workspace: configuration, I/O, LLM, prompt, data source, splitting
//! and storage errors.

use thiserror::Error;

/// Unified error type for Magnet knowledge sync.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
/// Expected "nothing to index" outcomes are not errors; they are modelled
/// by the knowledge crate as skip reasons.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// A record id was requested that is not part of the loaded batch
    #[error("Not found: {0}")]
    NotFound(String),

    /// A splitter strategy string that no splitter understands
    #[error("Unsupported chunking strategy: {0}")]
    UnsupportedStrategy(String),

    /// A source record that lacks required identity fields
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Data source and content download errors
    #[error("Source error: {0}")]
    Source(String),

    /// Errors raised while splitting content into chunks
    #[error("Splitter error: {0}")]
    Splitter(String),

    /// Document storage errors
    #[error("Storage error: {0}")]
    Storage(String),

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
    fn test_error_display() {
        let err = AppError::NotFound("record 'A'".to_string());
        assert_eq!(err.to_string(), "Not found: record 'A'");

        let err = AppError::UnsupportedStrategy("semantic".to_string());
        assert_eq!(err.to_string(), "Unsupported chunking strategy: semantic");
    }

    #[test]
    fn test_from_serde_json() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
        let err: AppError = parse.unwrap_err().into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
