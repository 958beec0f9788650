//! # DomainError
//!
//! Centralized error handling for the repository backend.
//! Every port and service returns this taxonomy; adapters translate their
//! own failures (sqlx, io, http) into it at the boundary.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found, or hidden from the caller by the visibility policy.
    /// Both cases render identically so existence never leaks.
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed or missing input (e.g., empty name, foreign email domain,
    /// out-of-range toggle value). Raised before any state change.
    #[error("validation error: {0}")]
    Validation(String),

    /// Duplicate unique key (author email, tag name, favorite pair,
    /// user/author relation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller lacks the role required by an admin-only operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Infrastructure failure (e.g., connection lost, transaction aborted).
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound(entity.to_string(), id.to_string())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(..))
    }
}

/// A specialized Result type for repository backend logic.
pub type Result<T> = std::result::Result<T, DomainError>;
