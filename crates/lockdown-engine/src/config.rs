//! Engine configuration.

/// What a save does when a field fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Abort the whole save with
    /// [`AccessError::ValidationFailed`](crate::AccessError::ValidationFailed).
    #[default]
    RejectSave,
    /// Leave the failing field out of the save and continue.
    DropField,
}

/// Configuration for the [`PermissionEngine`](crate::PermissionEngine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Check field writability and validation eagerly on assignment, for
    /// records inside a transaction scope or not yet persisted.
    pub validate_on_assign: bool,
    /// Save-time handling of validation failures.
    pub validation_policy: ValidationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validate_on_assign: true,
            validation_policy: ValidationPolicy::RejectSave,
        }
    }
}
