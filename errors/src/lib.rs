//! # Remote Configuration Errors
//!
//! Error handling for the remote configuration core.
//!
//! Follows Microsoft Pragmatic Rust Guidelines:
//! - Uses `thiserror` for structured error definitions
//! - Provides `Display` and `Error` trait implementations
//! - Exposes a stable, serializable [`ErrorKind`] for callers that need to
//!   branch on the failure class rather than on the message

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable failure class of a [`CoreError`].
///
/// Serializes in snake_case (`"not_found"`, `"io_failure"`, ...) so it can be
/// forwarded to callers in other processes unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    IoFailure,
    SerializationFailure,
    InvalidInput,
    InvalidCache,
    ConfigurationRetrievalFailure,
    ExtractionFailure,
    CommandFailure,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::IoFailure => "io_failure",
            Self::SerializationFailure => "serialization_failure",
            Self::InvalidInput => "invalid_input",
            Self::InvalidCache => "invalid_cache",
            Self::ConfigurationRetrievalFailure => "configuration_retrieval_failure",
            Self::ExtractionFailure => "extraction_failure",
            Self::CommandFailure => "command_failure",
            Self::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the cache, the document provider, the bundle pipeline
/// and its collaborators.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("File not found: {path}")]
    NotFound { path: String },

    #[error("Failed to read '{path}': {reason}")]
    IoFailure { path: String, reason: String },

    #[error("Serialization failure: {reason}")]
    SerializationFailure { reason: String },

    #[error("Invalid input at '{segment}': {reason}")]
    InvalidInput { segment: String, reason: String },

    #[error("Invalid cache entry '{key}': {reason}")]
    InvalidCache { key: String, reason: String },

    #[error("Configuration retrieval failed: {reason}")]
    ConfigurationRetrievalFailure { reason: String },

    #[error("Extraction failed: {reason}")]
    ExtractionFailure { reason: String },

    #[error("Command '{command}' failed: {reason}")]
    CommandFailure { command: String, reason: String },

    #[error("Timeout: {operation} took longer than {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::IoFailure { .. } => ErrorKind::IoFailure,
            Self::SerializationFailure { .. } => ErrorKind::SerializationFailure,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::InvalidCache { .. } => ErrorKind::InvalidCache,
            Self::ConfigurationRetrievalFailure { .. } => ErrorKind::ConfigurationRetrievalFailure,
            Self::ExtractionFailure { .. } => ErrorKind::ExtractionFailure,
            Self::CommandFailure { .. } => ErrorKind::CommandFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    pub fn invalid_input(segment: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            segment: segment.into(),
            reason: reason.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
