//! Field-grained operations: read filtering, write filtering, validation,
//! and checked assignment.

use tracing::{debug, warn};

use lockdown_core::{check_validation, Context, CoreError, Entity, FieldMap, RuleSet, Value};

use crate::engine::{applicable, PermissionEngine};
use crate::error::{AccessError, Result};

impl PermissionEngine {
    /// The subset of `loaded` the active context may see.
    ///
    /// Empty when the record itself is not readable.
    pub fn filter_readable_fields(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        loaded: &FieldMap,
        rule_sets: Option<&[&RuleSet]>,
    ) -> FieldMap {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        if !self.is_readable(ctx, entity, Some(&*rule_sets)) {
            return FieldMap::new();
        }
        loaded
            .iter()
            .filter(|(field, _)| self.is_field_readable(ctx, entity, field, Some(&*rule_sets)))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// The subset of `proposed` the active context may write to `entity`.
    pub fn filter_writable_fields(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        proposed: &FieldMap,
        rule_sets: Option<&[&RuleSet]>,
    ) -> FieldMap {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        proposed
            .iter()
            .filter(|(field, _)| self.is_field_writable(ctx, entity, field, Some(&*rule_sets)))
            .map(|(field, value)| (field.clone(), value.clone()))
            .collect()
    }

    /// Apply read policy to a record freshly populated from storage.
    ///
    /// Fails with [`AccessError::NotReadable`] if the record cannot be read.
    /// Otherwise every field the context may not read is removed from the
    /// record. The unfiltered values are handed to
    /// [`Entity::retain_raw`] so non-authorization concerns can still see
    /// them. Returns the names of the stripped fields.
    pub fn materialize(&self, ctx: &Context, entity: &mut dyn Entity) -> Result<Vec<String>> {
        let rule_sets = ctx.rule_sets(entity.entity_type());
        if !self.is_readable(ctx, &*entity, Some(rule_sets.as_slice())) {
            return Err(AccessError::NotReadable {
                entity_type: entity.entity_type().name().to_string(),
            });
        }

        let raw = entity.field_values();
        // Decide against the unmodified record, then strip.
        let rule_sets = rule_sets.as_slice();
        let stripped: Vec<String> = raw
            .keys()
            .filter(|field| !self.is_field_readable(ctx, &*entity, field, Some(rule_sets)))
            .cloned()
            .collect();

        for field in &stripped {
            debug!(
                entity_type = %entity.entity_type(),
                field = %field,
                "stripping unreadable field"
            );
            entity.take_field(field);
        }
        entity.retain_raw(raw);

        Ok(stripped)
    }

    /// Run every applicable validation rule for `field` against `value`.
    pub fn validate_field(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        field: &str,
        value: &Value,
        rule_sets: Option<&[&RuleSet]>,
    ) -> Result<()> {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        let valid = rule_sets
            .iter()
            .filter_map(|r| r.field_validation_rules.get(field))
            .all(|rule| check_validation(ctx, entity, field, value, rule));

        if valid {
            Ok(())
        } else {
            warn!(entity_type = %entity.entity_type(), field = %field, "validation failed");
            Err(AccessError::ValidationFailed {
                entity_type: entity.entity_type().name().to_string(),
                field: field.to_string(),
            })
        }
    }

    /// Assign `field` on behalf of the active context.
    ///
    /// When assignment checks are enabled and the context is inside a
    /// transaction scope, or the record has not been persisted, the field
    /// must be writable and pass validation before the value is accepted;
    /// the active role is then recorded as the field's provenance. Any other
    /// assignment clears the field's provenance, so the save re-checks it.
    /// Assigning the primary key of an unpersisted record is never checked.
    pub fn set_field(
        &self,
        ctx: &Context,
        entity: &mut dyn Entity,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        let value = value.into();
        let entity_type = entity.entity_type().clone();
        if !entity_type.has_field(field) {
            return Err(CoreError::UnknownField {
                entity_type: entity_type.name().to_string(),
                field: field.to_string(),
            }
            .into());
        }

        let persisted = entity.is_persisted();
        let assigning_key = !persisted && field == entity_type.primary_key();
        let eager =
            self.config().validate_on_assign && (ctx.in_transaction() || !persisted);

        if eager && !assigning_key {
            let rule_sets = ctx.rule_sets(&entity_type);
            if !self.is_field_writable(ctx, &*entity, field, Some(rule_sets.as_slice())) {
                debug!(entity_type = %entity_type, field = %field, "assignment denied");
                return Err(AccessError::FieldNotWritable {
                    entity_type: entity_type.name().to_string(),
                    field: field.to_string(),
                });
            }
            self.validate_field(ctx, &*entity, field, &value, Some(rule_sets.as_slice()))?;
        }

        // Provenance describes the latest assignment only; an unchecked one
        // must not inherit an earlier entry.
        match ctx.active_role() {
            Some(role) if eager && !assigning_key => {
                entity
                    .provenance_mut()
                    .record(field, role.clone(), ctx.in_transaction());
            }
            _ => entity.provenance_mut().forget(field),
        }

        entity.put_field(field, value);
        Ok(())
    }

    /// Assign fields from a trusted source (e.g. storage) without checks.
    pub fn populate(entity: &mut dyn Entity, fields: FieldMap) {
        for (field, value) in fields {
            entity.put_field(&field, value);
        }
    }
}
