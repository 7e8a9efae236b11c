//! Error taxonomy shared by every pipeline stage.
//!
//! Each variant corresponds to one failure class of the ingestion and chat
//! pipelines. Frontends map them onto transport status codes via
//! [`Error::code`] and [`Error::is_client_error`].

use thiserror::Error;

/// Pipeline error.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum Error {
    /// Malformed or unrecognized input; rejected before any I/O.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown model name or source configuration.
    #[error("not found: {0}")]
    NotFound(String),

    /// An embedding or chat provider answered with a non-success status or a
    /// body that could not be interpreted.
    #[error("provider error: {0}")]
    Provider(String),

    /// The vector store is unreachable or rejected a read/write.
    #[error("storage error: {0}")]
    Storage(String),

    /// Embedding dimensionality does not match the collection.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    /// A connection or call exceeded its time budget.
    #[error("timed out: {0}")]
    Timeout(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Machine-readable error code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Provider(_) => "provider_error",
            Self::Storage(_) => "storage_error",
            Self::Dimension { .. } => "dimension_mismatch",
            Self::Timeout(_) => "timeout",
        }
    }

    /// `true` when the caller, not an upstream dependency, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Dimension { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
