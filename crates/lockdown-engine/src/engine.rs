//! The layered permission decisions.
//!
//! Layers build on each other:
//!
//! - readable: every read rule passes
//! - field readable: readable, and every read rule for the field passes
//! - writable: readable, and every write rule passes
//! - field writable: writable, field readable, and every write rule for the field passes
//! - creatable: every create rule passes (no instance needed)
//! - deletable: writable, and every delete rule passes
//!
//! Each layer is a strict conjunction over all applicable rule sets; a
//! missing rule adds no constraint. Every check accepts an optional
//! pre-collected slice of rule sets so composite operations collect them
//! once.

use std::borrow::Cow;

use tracing::{debug, trace};

use lockdown_core::{check_rule, Context, Entity, EntityType, RuleExpr, RuleSet};

use crate::config::EngineConfig;
use crate::error::{AccessError, Result};

/// The decision engine.
///
/// Stateless apart from its configuration; safe to share.
#[derive(Debug, Clone, Default)]
pub struct PermissionEngine {
    config: EngineConfig,
}

impl PermissionEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Record-level decisions
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether the active context may read `entity`.
    pub fn is_readable(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        let allowed = all_pass(
            ctx,
            Some(entity),
            rule_sets.iter().map(|r| r.read_rule.as_ref()),
        );
        if !allowed {
            debug!(entity_type = %entity.entity_type(), "read denied");
        }
        allowed
    }

    /// Whether the active context may read `field` of `entity`.
    pub fn is_field_readable(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        field: &str,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        self.is_readable(ctx, entity, Some(&*rule_sets))
            && all_pass(
                ctx,
                Some(entity),
                rule_sets.iter().map(|r| r.field_read_rules.get(field)),
            )
    }

    /// Whether the active context may modify `entity`.
    ///
    /// A record that cannot be read cannot be written.
    pub fn is_writable(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        if !self.is_readable(ctx, entity, Some(&*rule_sets)) {
            return false;
        }
        let allowed = all_pass(
            ctx,
            Some(entity),
            rule_sets.iter().map(|r| r.write_rule.as_ref()),
        );
        if !allowed {
            debug!(entity_type = %entity.entity_type(), "write denied");
        }
        allowed
    }

    /// Whether the active context may modify `field` of `entity`.
    ///
    /// Requires the record to be writable and the field to be readable.
    pub fn is_field_writable(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        field: &str,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        self.is_writable(ctx, entity, Some(&*rule_sets))
            && self.is_field_readable(ctx, entity, field, Some(&*rule_sets))
            && all_pass(
                ctx,
                Some(entity),
                rule_sets.iter().map(|r| r.field_write_rules.get(field)),
            )
    }

    /// Whether the active context may create a record of `entity_type`.
    ///
    /// `candidate` is the record about to be inserted, if one exists yet.
    /// Unset fields of the candidate (or every field, without a candidate)
    /// satisfy equality rules vacuously.
    pub fn is_creatable(
        &self,
        ctx: &Context,
        entity_type: &EntityType,
        candidate: Option<&dyn Entity>,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity_type, rule_sets);
        let allowed = all_pass(
            ctx,
            candidate,
            rule_sets.iter().map(|r| r.create_rule.as_ref()),
        );
        if !allowed {
            debug!(entity_type = %entity_type, "create denied");
        }
        allowed
    }

    /// Whether the active context may delete `entity`.
    pub fn is_deletable(
        &self,
        ctx: &Context,
        entity: &dyn Entity,
        rule_sets: Option<&[&RuleSet]>,
    ) -> bool {
        let rule_sets = applicable(ctx, entity.entity_type(), rule_sets);
        if !self.is_writable(ctx, entity, Some(&*rule_sets)) {
            return false;
        }
        let allowed = all_pass(
            ctx,
            Some(entity),
            rule_sets.iter().map(|r| r.delete_rule.as_ref()),
        );
        if !allowed {
            debug!(entity_type = %entity.entity_type(), "delete denied");
        }
        allowed
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Result-returning variants
    // ─────────────────────────────────────────────────────────────────────────

    pub fn ensure_readable(&self, ctx: &Context, entity: &dyn Entity) -> Result<()> {
        if self.is_readable(ctx, entity, None) {
            Ok(())
        } else {
            Err(AccessError::NotReadable {
                entity_type: entity.entity_type().name().to_string(),
            })
        }
    }

    pub fn ensure_writable(&self, ctx: &Context, entity: &dyn Entity) -> Result<()> {
        if self.is_writable(ctx, entity, None) {
            Ok(())
        } else {
            Err(AccessError::NotWritable {
                entity_type: entity.entity_type().name().to_string(),
            })
        }
    }

    pub fn ensure_creatable(
        &self,
        ctx: &Context,
        entity_type: &EntityType,
        candidate: Option<&dyn Entity>,
    ) -> Result<()> {
        if self.is_creatable(ctx, entity_type, candidate, None) {
            Ok(())
        } else {
            Err(AccessError::NotCreatable {
                entity_type: entity_type.name().to_string(),
            })
        }
    }

    pub fn ensure_deletable(&self, ctx: &Context, entity: &dyn Entity) -> Result<()> {
        if self.is_deletable(ctx, entity, None) {
            Ok(())
        } else {
            Err(AccessError::NotDeletable {
                entity_type: entity.entity_type().name().to_string(),
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Query support
    // ─────────────────────────────────────────────────────────────────────────

    /// The read rule to inject into queries for `entity_type`.
    ///
    /// The conjunction of every applicable read rule, or `None` when nothing
    /// constrains reads (including when no role is active).
    pub fn read_predicate(&self, ctx: &Context, entity_type: &EntityType) -> Option<RuleExpr> {
        let rule_sets = ctx.rule_sets(entity_type);
        trace!(entity_type = %entity_type, rule_sets = rule_sets.len(), "building read predicate");
        RuleExpr::all(rule_sets.iter().filter_map(|r| r.read_rule.clone()))
    }
}

/// Use the given rule sets, or collect them from the active role.
pub(crate) fn applicable<'s, 'c>(
    ctx: &'c Context,
    entity_type: &EntityType,
    given: Option<&'s [&'c RuleSet]>,
) -> Cow<'s, [&'c RuleSet]> {
    match given {
        Some(rule_sets) => Cow::Borrowed(rule_sets),
        None => Cow::Owned(ctx.rule_sets(entity_type)),
    }
}

/// Every present rule passes; absent rules are unconstrained.
fn all_pass<'r>(
    ctx: &Context,
    subject: Option<&dyn Entity>,
    rules: impl IntoIterator<Item = Option<&'r RuleExpr>>,
) -> bool {
    rules
        .into_iter()
        .flatten()
        .all(|rule| check_rule(ctx, subject, rule))
}
