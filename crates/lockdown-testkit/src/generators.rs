//! Proptest generators for property-based testing.
//!
//! Values are drawn from small domains so that generated rules and records
//! actually agree some of the time.

use proptest::prelude::*;

use lockdown_core::{Context, EntityType, Record, RuleExpr, Value};

/// Fields generated rules and records refer to.
pub const FIELDS: [&str; 3] = ["owner", "group", "serial"];

/// Context variables generated rules refer to.
pub const VARIABLES: [&str; 2] = ["user", "group"];

/// Generate a scalar value from a small domain.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (0i64..4).prop_map(Value::Int),
        prop::sample::select(vec!["a", "b"]).prop_map(Value::from),
    ]
}

/// Generate a value: a scalar, a reference to a scalar, or a short list.
pub fn value() -> impl Strategy<Value = Value> {
    prop_oneof![
        4 => scalar(),
        1 => (0i64..4).prop_map(|id| Value::reference("user", id)),
        1 => prop::collection::vec(scalar(), 0..3).prop_map(Value::List),
    ]
}

/// Generate an operand: a literal, field reference, or context reference.
pub fn operand() -> impl Strategy<Value = RuleExpr> {
    prop_oneof![
        value().prop_map(RuleExpr::literal),
        prop::sample::select(FIELDS.to_vec()).prop_map(RuleExpr::field),
        prop::sample::select(VARIABLES.to_vec()).prop_map(RuleExpr::context),
    ]
}

/// Generate a rule expression without predicates.
pub fn rule_expr() -> impl Strategy<Value = RuleExpr> {
    let leaf = prop_oneof![
        Just(RuleExpr::Everyone),
        Just(RuleExpr::NoOne),
        (operand(), operand()).prop_map(|(l, r)| l.eq(r)),
        (operand(), prop::collection::vec(operand(), 1..3)).prop_map(|(l, c)| l.is_in(c)),
    ];
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
            (inner.clone(), inner).prop_map(|(l, r)| l.or(r)),
        ]
    })
}

/// Generate a rule expression that may contain constant predicates.
pub fn rule_expr_with_predicates() -> impl Strategy<Value = RuleExpr> {
    let leaf = prop_oneof![
        3 => rule_expr(),
        1 => any::<bool>().prop_map(|b| RuleExpr::predicate(move |_| b)),
    ];
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(l, r)| l.and(r)),
            (inner.clone(), inner).prop_map(|(l, r)| l.or(r)),
        ]
    })
}

/// Generate a context with some of [`VARIABLES`] set. No role is active.
pub fn context() -> impl Strategy<Value = Context> {
    prop::collection::vec(prop::option::of(value()), VARIABLES.len()).prop_map(|values| {
        let mut ctx = Context::new();
        for (name, value) in VARIABLES.iter().zip(values) {
            if let Some(value) = value {
                ctx.set(*name, value);
            }
        }
        ctx
    })
}

/// Generate a record of `entity_type`, persisted or not, with some of
/// [`FIELDS`] set. The type must declare them.
pub fn record(entity_type: EntityType) -> impl Strategy<Value = Record> {
    (
        prop::option::of(1i64..100),
        prop::collection::vec(prop::option::of(value()), FIELDS.len()),
    )
        .prop_map(move |(id, values)| {
            let mut record = Record::new(&entity_type);
            if let Some(id) = id {
                record = record.with("id", id);
            }
            for (name, value) in FIELDS.iter().zip(values) {
                if let Some(value) = value {
                    record = record.with(*name, value);
                }
            }
            record
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lockdown_core::{check_rule, Role, RuleSet, EVERYONE, NO_ONE};
    use lockdown_engine::PermissionEngine;

    use super::*;
    use crate::fixtures::Schema;

    fn bicycle() -> EntityType {
        Schema::new().bicycle
    }

    proptest! {
        #[test]
        fn sentinels_are_identities(
            rule in rule_expr(),
            ctx in context(),
            rec in record(bicycle())
        ) {
            let expected = check_rule(&ctx, Some(&rec), &rule);
            prop_assert_eq!(check_rule(&ctx, Some(&rec), &EVERYONE.and(rule.clone())), expected);
            prop_assert_eq!(check_rule(&ctx, Some(&rec), &NO_ONE.or(rule.clone())), expected);
            prop_assert!(!check_rule(&ctx, Some(&rec), &NO_ONE.and(rule.clone())));
            prop_assert!(check_rule(&ctx, Some(&rec), &EVERYONE.or(rule)));
        }

        #[test]
        fn evaluation_is_deterministic(
            rule in rule_expr(),
            ctx in context(),
            rec in record(bicycle())
        ) {
            prop_assert_eq!(
                check_rule(&ctx, Some(&rec), &rule),
                check_rule(&ctx, Some(&rec), &rule)
            );
        }

        #[test]
        fn binding_context_preserves_decisions(
            rule in rule_expr(),
            ctx in context(),
            rec in record(bicycle())
        ) {
            let bound = rule.bind_context(&ctx);
            prop_assert_eq!(
                check_rule(&ctx, Some(&rec), &rule),
                check_rule(&Context::new(), Some(&rec), &bound)
            );
        }

        #[test]
        fn relaxing_predicates_only_widens(
            rule in rule_expr_with_predicates(),
            ctx in context(),
            rec in record(bicycle())
        ) {
            if check_rule(&ctx, Some(&rec), &rule) {
                prop_assert!(check_rule(&ctx, Some(&rec), &rule.relax_predicates()));
            }
        }

        #[test]
        fn extra_rule_sets_never_grant(
            own in rule_expr(),
            inherited in rule_expr(),
            ctx in context(),
            rec in record(bicycle())
        ) {
            let schema = Schema::new();
            let engine = PermissionEngine::default();

            let mut parent = Role::new("parent");
            parent.lockdown(&schema.vehicle).readable_by(inherited);
            let mut child = Role::with_parents("child", [Arc::new(parent)]);
            child.lockdown(&schema.bicycle).readable_by(own.clone());

            let mut alone = Role::new("alone");
            alone.lockdown(&schema.bicycle).readable_by(own);

            let mut with_parent = ctx.clone();
            with_parent.set_role(Some(Arc::new(child)));
            let mut without_parent = ctx;
            without_parent.set_role(Some(Arc::new(alone)));

            if engine.is_readable(&with_parent, &rec, None) {
                prop_assert!(engine.is_readable(&without_parent, &rec, None));
            }
        }

        #[test]
        fn collected_rule_sets_are_distinct(depth in 1usize..4, width in 1usize..3) {
            let schema = Schema::new();
            let mut layer: Vec<Arc<Role>> = {
                let mut root = Role::new("root");
                root.lockdown(&schema.vehicle).readable_by(EVERYONE);
                root.lockdown(&schema.bicycle).readable_by(EVERYONE);
                vec![Arc::new(root)]
            };
            for level in 0..depth {
                layer = (0..width)
                    .map(|i| {
                        let name = format!("r{level}-{i}");
                        let mut role = Role::with_parents(name, layer.clone());
                        role.lockdown(&schema.bicycle).writeable_by(EVERYONE);
                        Arc::new(role)
                    })
                    .collect();
            }

            for role in &layer {
                let collected = role.collect_rule_sets(&schema.bicycle);
                let mut seen: Vec<*const RuleSet> =
                    collected.iter().map(|r| *r as *const RuleSet).collect();
                let total = seen.len();
                seen.sort();
                seen.dedup();
                prop_assert_eq!(seen.len(), total);
            }
        }
    }
}
