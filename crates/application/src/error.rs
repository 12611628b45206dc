//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Clone, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(DomainError),

    /// Provider rejected the credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider does not know the location
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Temporary failure (timeout, rate limited, provider 5xx)
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Response or input failed validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Provider returned an unexpected status
    #[error("Provider error: {0}")]
    Provider(String),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notification delivery failure
    #[error("Notification failed: {0}")]
    Notification(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for ApplicationError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidLocation(msg) => Self::InvalidLocation(msg),
            other => Self::Domain(other),
        }
    }
}

impl ApplicationError {
    /// Check if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Fatal errors stop a batch: repeating the call cannot succeed
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
