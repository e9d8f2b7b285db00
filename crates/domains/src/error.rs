//! # DomainError
//!
//! Centralized error handling for the event board.
//! Every port returns this type so services can branch on the failure class
//! without knowing which adapter produced it.

use thiserror::Error;

/// The primary error type for all domain and port operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Event, Application, Message)
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Validation failure caught before any store call
    /// (missing field, date out of window, tag limit, bad upload).
    #[error("validation error: {0}")]
    Validation(String),

    /// No session, or the session token could not be verified.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but the role or ownership does not permit the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate normalized-name key)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Posting or messaging quota exhausted, or cooldown still running.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// An outbound notice (email webhook, code exchange) could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Infrastructure failure (e.g., DB down, object storage timeout)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound(entity, id.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// True for failures of the store or object storage rather than of the request.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Internal(_) | Self::Delivery(_))
    }
}

/// A specialized Result type for domain logic.
pub type Result<T> = std::result::Result<T, DomainError>;
