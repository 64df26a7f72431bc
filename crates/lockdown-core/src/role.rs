//! Roles: named policy scopes with inheritance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::entity::EntityType;
use crate::ruleset::RuleSet;

/// A named policy scope.
///
/// A role owns at most one [`RuleSet`] per entity type and may inherit from
/// parent roles. Parents are shared behind `Arc` and never mutated through a
/// child; build a role completely, then wrap it in an `Arc` to activate it or
/// use it as a parent.
#[derive(Debug, Clone)]
pub struct Role {
    name: String,
    parents: Vec<Arc<Role>>,
    rule_sets: HashMap<EntityType, RuleSet>,
}

impl Role {
    /// Create a root role.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_parents(name, Vec::new())
    }

    /// Create a role inheriting from `parents`, in declared order.
    pub fn with_parents(
        name: impl Into<String>,
        parents: impl IntoIterator<Item = Arc<Role>>,
    ) -> Self {
        Self {
            name: name.into(),
            parents: parents.into_iter().collect(),
            rule_sets: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[Arc<Role>] {
        &self.parents
    }

    /// Start declaring the rules for `entity_type`, replacing any earlier
    /// declaration for that type on this role.
    pub fn lockdown(&mut self, entity_type: &EntityType) -> &mut RuleSet {
        let slot = self
            .rule_sets
            .entry(entity_type.clone())
            .or_insert_with(|| RuleSet::new(entity_type));
        *slot = RuleSet::new(entity_type);
        slot
    }

    /// The rule set this role itself declares for `entity_type`.
    pub fn rule_set(&self, entity_type: &EntityType) -> Option<&RuleSet> {
        self.rule_sets.get(entity_type)
    }

    /// Every rule set that applies to `entity_type` under this role.
    ///
    /// Order: each parent's collection in declared order, then this role's
    /// own rule set, then the collection for the base type. A rule set
    /// reachable along several paths appears once, at its first position.
    pub fn collect_rule_sets(&self, entity_type: &EntityType) -> Vec<&RuleSet> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_into(entity_type, &mut out, &mut seen);
        out
    }

    fn collect_into<'a>(
        &'a self,
        entity_type: &EntityType,
        out: &mut Vec<&'a RuleSet>,
        seen: &mut HashSet<*const RuleSet>,
    ) {
        for parent in &self.parents {
            parent.collect_into(entity_type, out, seen);
        }

        if let Some(rules) = self.rule_sets.get(entity_type) {
            if seen.insert(rules as *const RuleSet) {
                out.push(rules);
            }
        }

        if let Some(base) = entity_type.base() {
            self.collect_into(base, out, seen);
        }
    }
}
