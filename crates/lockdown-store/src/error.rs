//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No row with this identity.
    #[error("{entity_type} {id} not found")]
    NotFound { entity_type: String, id: String },

    /// The operation needs an identity and the record has none.
    #[error("{0} has no identity")]
    MissingIdentity(String),

    /// The entity type was never registered with the store.
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// A row with this identity already exists.
    #[error("conflict: {entity_type} {id} already exists")]
    Conflict { entity_type: String, id: String },

    /// Invalid data handed to the store.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
