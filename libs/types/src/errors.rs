//! Error taxonomy for the callable operations
//!
//! One flat enum covering every failure a caller can observe. Each variant
//! maps to a stable wire-style code string via [`ServiceError::code`];
//! collaborator failures are wrapped as `Internal` so their detail never
//! reaches the caller.

use thiserror::Error;

/// Top-level operation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed input: bad enum value, non-positive price or shares,
    /// missing season for an official game
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// No caller identity was supplied
    #[error("unauthenticated")]
    Unauthenticated,

    /// The operation is not legal in the current state: wrong lifecycle
    /// phase, caller not joined, order not open, settlement already running
    #[error("failed precondition: {message}")]
    FailedPrecondition { message: String },

    /// A referenced game, market, order, team, or user does not exist
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Acting on another party's order
    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    /// Unexpected collaborator failure, detail withheld from callers
    #[error("internal: {message}")]
    Internal { message: String },
}

impl ServiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::FailedPrecondition {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable code string for logs and wire surfaces
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::InvalidArgument { .. } => "invalid-argument",
            ServiceError::Unauthenticated => "unauthenticated",
            ServiceError::FailedPrecondition { .. } => "failed-precondition",
            ServiceError::NotFound { .. } => "not-found",
            ServiceError::PermissionDenied { .. } => "permission-denied",
            ServiceError::Internal { .. } => "internal",
        }
    }
}
