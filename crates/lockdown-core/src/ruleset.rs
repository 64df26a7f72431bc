//! Rules attached to one entity type under one role.

use std::collections::BTreeMap;

use crate::entity::EntityType;
use crate::rule::RuleExpr;

/// The rules one role declares for one entity type.
///
/// A missing rule means the layer is unconstrained. Built through the
/// chainable setters returned by [`Role::lockdown`](crate::Role::lockdown):
///
/// ```
/// use lockdown_core::{EntityType, Role, RuleExpr, NO_ONE};
///
/// let bicycle = EntityType::builder("bicycle").fields(["owner", "group", "serial"]).build();
/// let mut role = Role::new("rest_api");
/// role.lockdown(&bicycle)
///     .readable_by(RuleExpr::field("group").eq(RuleExpr::context("group")))
///     .writeable_by(RuleExpr::field("owner").eq(RuleExpr::context("user")))
///     .deleteable_by(NO_ONE);
/// ```
#[derive(Debug, Clone)]
pub struct RuleSet {
    entity_type: EntityType,
    pub read_rule: Option<RuleExpr>,
    pub create_rule: Option<RuleExpr>,
    pub write_rule: Option<RuleExpr>,
    pub delete_rule: Option<RuleExpr>,
    pub field_read_rules: BTreeMap<String, RuleExpr>,
    pub field_write_rules: BTreeMap<String, RuleExpr>,
    pub field_validation_rules: BTreeMap<String, RuleExpr>,
}

impl RuleSet {
    /// An empty rule set: everything unconstrained.
    pub fn new(entity_type: &EntityType) -> Self {
        Self {
            entity_type: entity_type.clone(),
            read_rule: None,
            create_rule: None,
            write_rule: None,
            delete_rule: None,
            field_read_rules: BTreeMap::new(),
            field_write_rules: BTreeMap::new(),
            field_validation_rules: BTreeMap::new(),
        }
    }

    /// The entity type these rules were declared for.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    pub fn readable_by(&mut self, expr: RuleExpr) -> &mut Self {
        self.read_rule = Some(expr);
        self
    }

    pub fn field_readable_by(&mut self, field: impl Into<String>, expr: RuleExpr) -> &mut Self {
        self.field_read_rules.insert(field.into(), expr);
        self
    }

    pub fn creatable_by(&mut self, expr: RuleExpr) -> &mut Self {
        self.create_rule = Some(expr);
        self
    }

    pub fn writeable_by(&mut self, expr: RuleExpr) -> &mut Self {
        self.write_rule = Some(expr);
        self
    }

    pub fn field_writeable_by(&mut self, field: impl Into<String>, expr: RuleExpr) -> &mut Self {
        self.field_write_rules.insert(field.into(), expr);
        self
    }

    /// Attach a validation rule to `field`.
    ///
    /// Validation rules see the proposed value through
    /// [`PredicateInput::value`](crate::PredicateInput::value) when written
    /// as predicates; in expression rules a reference to `field` resolves to
    /// the proposed value.
    pub fn validate(&mut self, field: impl Into<String>, expr: RuleExpr) -> &mut Self {
        self.field_validation_rules.insert(field.into(), expr);
        self
    }

    pub fn deleteable_by(&mut self, expr: RuleExpr) -> &mut Self {
        self.delete_rule = Some(expr);
        self
    }

    /// Whether no rule of any kind is declared.
    pub fn is_empty(&self) -> bool {
        self.read_rule.is_none()
            && self.create_rule.is_none()
            && self.write_rule.is_none()
            && self.delete_rule.is_none()
            && self.field_read_rules.is_empty()
            && self.field_write_rules.is_empty()
            && self.field_validation_rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{EVERYONE, NO_ONE};

    #[test]
    fn test_builder_chain() {
        let ty = EntityType::builder("bicycle").field("serial").build();
        let mut rules = RuleSet::new(&ty);
        assert!(rules.is_empty());

        rules
            .readable_by(EVERYONE)
            .field_readable_by("serial", NO_ONE)
            .creatable_by(EVERYONE)
            .writeable_by(NO_ONE)
            .field_writeable_by("serial", EVERYONE)
            .validate("serial", RuleExpr::field("serial"))
            .deleteable_by(NO_ONE);

        assert!(!rules.is_empty());
        assert!(rules.read_rule.is_some());
        assert!(rules.field_read_rules.contains_key("serial"));
        assert!(rules.field_write_rules.contains_key("serial"));
        assert!(rules.field_validation_rules.contains_key("serial"));
        assert_eq!(rules.entity_type().name(), "bicycle");
    }

    #[test]
    fn test_setter_replaces() {
        let ty = EntityType::builder("bicycle").build();
        let mut rules = RuleSet::new(&ty);
        rules.readable_by(EVERYONE).readable_by(NO_ONE);
        assert!(matches!(rules.read_rule, Some(RuleExpr::NoOne)));
    }
}
