// ABOUTME: Error types for secret store access.
// ABOUTME: Separates missing paths from every other store failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no secret at {0}")]
    NotFound(String),

    #[error("store permission denied for {0}")]
    PermissionDenied(String),

    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected store response: {0}")]
    Protocol(String),

    #[error("malformed record at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
