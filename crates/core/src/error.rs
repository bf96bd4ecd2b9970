//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing records, conflicts with current state). Persistence and transport
/// failures belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (non-positive capacity, seats out of range, bad group size, illegal transition).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown table or group.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request is well-formed but clashes with current state
    /// (insufficient capacity, table already grouped, live group member).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internally discovered illegal state. Always a programming or data error.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// HTTP status a transport layer should use when surfacing this error.
    pub fn http_status(&self) -> u16 {
        match self {
            DomainError::Validation(_) | DomainError::InvalidId(_) => 400,
            DomainError::NotFound(_) => 404,
            DomainError::Conflict(_) => 409,
            DomainError::InvariantViolation(_) => 422,
        }
    }

    /// Stable machine-readable code (`"validation_error"`, `"not_found"`, ...).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
        }
    }
}
