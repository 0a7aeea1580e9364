//! Error types for the PolicyQA assistant.
//!
//! This module defines a unified error enum covering configuration, document
//! extraction, index access, embedding, and generation failures.
//!
//! Absence of evidence is deliberately not represented here: a query that
//! retrieves nothing resolves to the canonical "not found" answer value.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for the PolicyQA assistant.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source document could not be extracted
    #[error("Failed to load {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// The index store cannot be queried or populated
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// The embedding provider failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The generative model did not answer within the allotted time
    #[error("Generation timed out after {seconds}s")]
    GenerationTimeout { seconds: u64 },

    /// The generative model failed to produce a response
    #[error("Generation error: {0}")]
    Generation(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a load error for a document path.
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AppError::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
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
