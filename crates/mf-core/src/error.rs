//! # AppError
//!
//! Centralized error handling for the forum.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all mf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Forum, Thread)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Validation failure (e.g., empty title, missing signup field)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The identity provider rejected the credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., DB down, identity provider unreachable)
    #[error("internal service error: {0}")]
    Internal(String),

    /// Resource already exists (e.g., duplicate forum slug)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rate limit exceeded
    #[error("too many requests: {0}")]
    RateLimitExceeded(String),
}

impl AppError {
    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        AppError::NotFound(kind.to_string(), id.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for forum logic.
pub type Result<T> = std::result::Result<T, AppError>;
