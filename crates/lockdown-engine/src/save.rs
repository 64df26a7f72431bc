//! Save-time planning: which fields of a record may be persisted.

use tracing::{debug, warn};

use lockdown_core::{Context, Entity, FieldMap};

use crate::config::ValidationPolicy;
use crate::engine::PermissionEngine;
use crate::error::{AccessError, Result};

/// The outcome of [`PermissionEngine::prepare_save`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavePlan {
    /// Fields to persist, with their values.
    pub fields: FieldMap,
    /// Candidate fields left out, because they were not writable or (under
    /// [`ValidationPolicy::DropField`]) failed validation.
    pub dropped: Vec<String>,
    /// Whether the record has no identity yet and will be inserted.
    pub is_new: bool,
}

impl SavePlan {
    /// Whether nothing is left to persist.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PermissionEngine {
    /// Decide what a save of `entity` may persist.
    ///
    /// Record-level checks come first and abort the save: a new record must
    /// be creatable, and every record must be writable. Candidate fields are
    /// the populated fields, narrowed to `only` when given. The primary key
    /// is a candidate only for new records and is never checked. Each other
    /// candidate is kept when its provenance shows it was validated during
    /// a transaction scope, or when it is writable now; anything else is
    /// dropped. Kept fields that were not validated at assignment are
    /// validated here, and failures follow the configured
    /// [`ValidationPolicy`].
    pub fn prepare_save(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        only: Option<&[&str]>,
    ) -> Result<SavePlan> {
        let entity_type = entity.entity_type();
        let rule_sets = ctx.rule_sets(entity_type);
        let rule_sets = rule_sets.as_slice();
        let is_new = !entity.is_persisted();

        if is_new && !self.is_creatable(ctx, entity_type, Some(entity), Some(rule_sets)) {
            return Err(AccessError::NotCreatable {
                entity_type: entity_type.name().to_string(),
            });
        }
        if !self.is_writable(ctx, entity, Some(rule_sets)) {
            return Err(AccessError::NotWritable {
                entity_type: entity_type.name().to_string(),
            });
        }

        let mut plan = SavePlan {
            is_new,
            ..SavePlan::default()
        };

        let candidates = entity
            .populated_fields()
            .into_iter()
            .filter(|field| only.map_or(true, |only| only.contains(&field.as_str())));

        for field in candidates {
            let Some(value) = entity.field(&field) else {
                continue;
            };

            if field == entity_type.primary_key() {
                if is_new {
                    plan.fields.insert(field, value.clone());
                }
                continue;
            }

            let pre_validated = entity.provenance().is_validated(&field);
            if !pre_validated && !self.is_field_writable(ctx, entity, &field, Some(rule_sets)) {
                debug!(entity_type = %entity_type, field = %field, "dropping unwritable field");
                plan.dropped.push(field);
                continue;
            }

            if !pre_validated {
                if let Err(err) = self.validate_field(ctx, entity, &field, value, Some(rule_sets)) {
                    match self.config().validation_policy {
                        ValidationPolicy::RejectSave => return Err(err),
                        ValidationPolicy::DropField => {
                            warn!(
                                entity_type = %entity_type,
                                field = %field,
                                "dropping invalid field"
                            );
                            plan.dropped.push(field);
                            continue;
                        }
                    }
                }
            }

            plan.fields.insert(field, value.clone());
        }

        debug!(
            entity_type = %entity_type,
            kept = plan.fields.len(),
            dropped = plan.dropped.len(),
            is_new,
            "save planned"
        );
        Ok(plan)
    }
}
