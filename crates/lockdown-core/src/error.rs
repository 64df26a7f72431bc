//! Error types for Lockdown Core.

use thiserror::Error;

/// Errors raised by core schema operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown field {field} on {entity_type}")]
    UnknownField { entity_type: String, field: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
