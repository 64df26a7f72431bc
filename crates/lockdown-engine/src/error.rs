//! Error types for the permission engine.

use lockdown_core::CoreError;
use thiserror::Error;

/// Decision failures raised by the engine.
///
/// All variants are local and final: nothing is retried here. Callers can
/// tell "you may not" ([`is_authorization`](Self::is_authorization)) from
/// "that value is invalid" ([`AccessError::ValidationFailed`]).
#[derive(Debug, Error)]
pub enum AccessError {
    /// The active context cannot read the record.
    #[error("{entity_type} is not readable")]
    NotReadable { entity_type: String },

    /// The active context cannot modify the record.
    #[error("{entity_type} is not writable")]
    NotWritable { entity_type: String },

    /// The active context cannot create records of this type.
    #[error("{entity_type} is not creatable")]
    NotCreatable { entity_type: String },

    /// The active context cannot delete the record.
    #[error("{entity_type} is not deletable")]
    NotDeletable { entity_type: String },

    /// A specific field cannot be written.
    #[error("field {field} of {entity_type} is not writable")]
    FieldNotWritable { entity_type: String, field: String },

    /// A field validation rule rejected the proposed value.
    #[error("validation failed for field {field} of {entity_type}")]
    ValidationFailed { entity_type: String, field: String },

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

impl AccessError {
    /// Whether this is a permission denial rather than invalid input.
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            AccessError::NotReadable { .. }
                | AccessError::NotWritable { .. }
                | AccessError::NotCreatable { .. }
                | AccessError::NotDeletable { .. }
                | AccessError::FieldNotWritable { .. }
        )
    }

    /// The field the error is about, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            AccessError::FieldNotWritable { field, .. }
            | AccessError::ValidationFailed { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_vs_validation() {
        let denied = AccessError::FieldNotWritable {
            entity_type: "bicycle".into(),
            field: "serial".into(),
        };
        let invalid = AccessError::ValidationFailed {
            entity_type: "bicycle".into(),
            field: "serial".into(),
        };

        assert!(denied.is_authorization());
        assert!(!invalid.is_authorization());
        assert_eq!(denied.field(), Some("serial"));
        assert_eq!(invalid.to_string(), "validation failed for field serial of bicycle");
    }
}
