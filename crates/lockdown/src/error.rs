//! Error types for the Repository.

use lockdown_engine::AccessError;
use lockdown_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Repository operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Permission denial or failed validation.
    #[error("access error: {0}")]
    Access(#[from] AccessError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No readable record with this identity.
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },
}

impl Error {
    /// Whether this is a permission denial.
    pub fn is_authorization(&self) -> bool {
        matches!(self, Error::Access(err) if err.is_authorization())
    }
}

impl From<lockdown_core::CoreError> for Error {
    fn from(err: lockdown_core::CoreError) -> Self {
        Error::Access(err.into())
    }
}

/// Result type for Repository operations.
pub type Result<T> = std::result::Result<T, Error>;
