//! Error types for document store operations

use thiserror::Error;

/// Document store error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, StoreError::PermissionDenied(_))
    }

    /// Backend errors carry their full context chain.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        StoreError::Backend(format!("{err:#}"))
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
