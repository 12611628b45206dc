//! Shared error mapping for the SQLite persistence layer

use application::error::ApplicationError;

/// Map a rusqlite, r2d2 or serialization error to a storage failure
pub fn storage_error(e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(e.to_string())
}

/// Map a blocking-task join failure
pub fn join_error(e: &tokio::task::JoinError) -> ApplicationError {
    ApplicationError::Internal(format!("storage task failed: {e}"))
}
