//! Rule evaluation against a record and the ambient context.
//!
//! Evaluation is pure and never fails. Field references read the record,
//! context references read the context, and references to other records
//! are reduced to their identities before comparison.
//!
//! # Nulls
//!
//! A null never equals anything. The one exception is the vacuous-null rule:
//! when an equality reads a field that is unset on a record without an
//! identity (a record being created), the equality holds. Creation rules can
//! then mention relations such as `owner` before they are assigned. A null
//! that comes from an unset context variable gets no such treatment, so a
//! missing context value always denies.

use crate::context::Context;
use crate::entity::Entity;
use crate::rule::{PredicateInput, RuleExpr};
use crate::value::Value;

/// Evaluate `rule` as a boolean.
///
/// `entity` is `None` when checking creation without a candidate record.
pub fn check_rule(ctx: &Context, entity: Option<&dyn Entity>, rule: &RuleExpr) -> bool {
    Evaluation::new(ctx, entity).check(rule)
}

/// Evaluate a validation rule for a proposed field value.
///
/// Within the rule, references to `field` resolve to `value`, and
/// predicates receive both.
pub fn check_validation(
    ctx: &Context,
    entity: &dyn Entity,
    field: &str,
    value: &Value,
    rule: &RuleExpr,
) -> bool {
    Evaluation {
        ctx,
        entity: Some(entity),
        proposed: Some((field, value)),
    }
    .check(rule)
}

/// Resolve `node` to a value, reducing record references to identities.
pub fn resolve(ctx: &Context, entity: Option<&dyn Entity>, node: &RuleExpr) -> Value {
    Evaluation::new(ctx, entity).resolve(node).value
}

struct Evaluation<'a> {
    ctx: &'a Context,
    entity: Option<&'a dyn Entity>,
    proposed: Option<(&'a str, &'a Value)>,
}

/// A resolved operand.
struct Resolved {
    value: Value,
    /// Unset field of a record without identity.
    vacuous: bool,
}

impl Resolved {
    fn plain(value: Value) -> Self {
        Self {
            value,
            vacuous: false,
        }
    }
}

impl<'a> Evaluation<'a> {
    fn new(ctx: &'a Context, entity: Option<&'a dyn Entity>) -> Self {
        Self {
            ctx,
            entity,
            proposed: None,
        }
    }

    fn check(&self, rule: &RuleExpr) -> bool {
        match rule {
            RuleExpr::Everyone => true,
            RuleExpr::NoOne => false,
            RuleExpr::And(l, r) => self.check(l) && self.check(r),
            RuleExpr::Or(l, r) => self.check(l) || self.check(r),
            RuleExpr::Eq(l, r) => {
                let (lhs, rhs) = (self.resolve(l), self.resolve(r));
                if lhs.vacuous || rhs.vacuous {
                    return true;
                }
                lhs.value.matches(&rhs.value)
            }
            RuleExpr::In(l, candidates) => {
                let needle = self.resolve(l).value;
                candidates.iter().any(|candidate| match self.resolve(candidate).value {
                    Value::List(items) => items.iter().any(|item| needle.matches(item)),
                    other => needle.matches(&other),
                })
            }
            RuleExpr::Predicate(p) => p.call(&PredicateInput {
                entity: self.entity,
                context: self.ctx,
                field: self.proposed.map(|(f, _)| f),
                value: self.proposed.map(|(_, v)| v),
            }),
            RuleExpr::Literal(_) | RuleExpr::Field(_) | RuleExpr::Context(_) => {
                self.resolve(rule).value.is_truthy()
            }
        }
    }

    fn resolve(&self, node: &RuleExpr) -> Resolved {
        match node {
            RuleExpr::Literal(v) => Resolved::plain(v.reduce().clone()),
            RuleExpr::Context(name) => Resolved::plain(
                self.ctx
                    .get(name)
                    .map(|v| v.reduce().clone())
                    .unwrap_or(Value::Null),
            ),
            RuleExpr::Field(name) => self.resolve_field(name),
            other => Resolved::plain(Value::Bool(self.check(other))),
        }
    }

    fn resolve_field(&self, name: &str) -> Resolved {
        if let Some((field, value)) = self.proposed {
            if field == name {
                return Resolved::plain(value.reduce().clone());
            }
        }

        let Some(entity) = self.entity else {
            return Resolved {
                value: Value::Null,
                vacuous: true,
            };
        };

        let value = entity
            .field(name)
            .map(|v| v.reduce().clone())
            .unwrap_or(Value::Null);
        let vacuous = value.is_null() && entity.identity().is_none();
        Resolved { value, vacuous }
    }
}
