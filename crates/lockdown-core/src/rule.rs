//! Rule expressions.
//!
//! A rule is a small expression tree over record fields, context variables
//! and literals. Rules are pure: they hold no state and are evaluated afresh
//! on every check.
//!
//! ```
//! use lockdown_core::RuleExpr;
//!
//! let same_group = RuleExpr::field("group").eq(RuleExpr::context("group"));
//! let owner = RuleExpr::field("owner").eq(RuleExpr::context("user"));
//! let rule = same_group & owner;
//! assert_eq!(rule.to_string(), "(field.group == context.group AND field.owner == context.user)");
//! ```

use std::fmt;
use std::ops::{BitAnd, BitOr};
use std::sync::Arc;

use crate::context::Context;
use crate::entity::Entity;
use crate::value::Value;

/// Rule that always passes.
pub const EVERYONE: RuleExpr = RuleExpr::Everyone;

/// Rule that never passes.
pub const NO_ONE: RuleExpr = RuleExpr::NoOne;

/// Arguments handed to a [`Predicate`].
#[derive(Clone, Copy)]
pub struct PredicateInput<'a> {
    /// The record under evaluation. `None` for a creation check without a
    /// candidate record.
    pub entity: Option<&'a dyn Entity>,
    /// The ambient context.
    pub context: &'a Context,
    /// The field being validated, for validation rules.
    pub field: Option<&'a str>,
    /// The proposed value, for validation rules.
    pub value: Option<&'a Value>,
}

type PredicateFn = dyn Fn(&PredicateInput<'_>) -> bool + Send + Sync;

/// An arbitrary boolean function over a record, used as a rule.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&PredicateInput<'_>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, input: &PredicateInput<'_>) -> bool {
        (self.0)(input)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(<fn>)")
    }
}

/// A rule expression.
#[derive(Debug, Clone)]
pub enum RuleExpr {
    /// Always true.
    Everyone,
    /// Always false.
    NoOne,
    /// A constant.
    Literal(Value),
    /// The record's current value of a field.
    Field(String),
    /// A named context variable.
    Context(String),
    /// Equality of two resolved values.
    Eq(Box<RuleExpr>, Box<RuleExpr>),
    /// Membership of a resolved value in a list of resolved values.
    In(Box<RuleExpr>, Vec<RuleExpr>),
    /// Short-circuit conjunction.
    And(Box<RuleExpr>, Box<RuleExpr>),
    /// Short-circuit disjunction.
    Or(Box<RuleExpr>, Box<RuleExpr>),
    /// Escape hatch.
    Predicate(Predicate),
}

impl RuleExpr {
    pub fn field(name: impl Into<String>) -> Self {
        RuleExpr::Field(name.into())
    }

    pub fn context(name: impl Into<String>) -> Self {
        RuleExpr::Context(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        RuleExpr::Literal(value.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&PredicateInput<'_>) -> bool + Send + Sync + 'static,
    {
        RuleExpr::Predicate(Predicate::new(f))
    }

    /// `self == rhs`.
    pub fn eq(self, rhs: impl Into<RuleExpr>) -> Self {
        RuleExpr::Eq(Box::new(self), Box::new(rhs.into()))
    }

    /// `self IN candidates`.
    pub fn is_in<I>(self, candidates: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<RuleExpr>,
    {
        RuleExpr::In(
            Box::new(self),
            candidates.into_iter().map(Into::into).collect(),
        )
    }

    /// `self AND rhs`.
    pub fn and(self, rhs: impl Into<RuleExpr>) -> Self {
        RuleExpr::And(Box::new(self), Box::new(rhs.into()))
    }

    /// `self OR rhs`.
    pub fn or(self, rhs: impl Into<RuleExpr>) -> Self {
        RuleExpr::Or(Box::new(self), Box::new(rhs.into()))
    }

    /// Conjunction of all rules, left-associated. `None` for an empty input.
    pub fn all<I>(rules: I) -> Option<Self>
    where
        I: IntoIterator<Item = RuleExpr>,
    {
        rules.into_iter().reduce(|acc, rule| acc.and(rule))
    }

    /// Replace every context reference with the context's current value.
    ///
    /// Storage collaborators use this to translate a read rule into a query
    /// filter without holding on to the context. Unset variables become
    /// `Null`, which never matches.
    pub fn bind_context(&self, ctx: &Context) -> Self {
        match self {
            RuleExpr::Context(name) => {
                RuleExpr::Literal(ctx.get(name).cloned().unwrap_or(Value::Null))
            }
            RuleExpr::Eq(l, r) => RuleExpr::Eq(
                Box::new(l.bind_context(ctx)),
                Box::new(r.bind_context(ctx)),
            ),
            RuleExpr::In(l, items) => RuleExpr::In(
                Box::new(l.bind_context(ctx)),
                items.iter().map(|i| i.bind_context(ctx)).collect(),
            ),
            RuleExpr::And(l, r) => RuleExpr::And(
                Box::new(l.bind_context(ctx)),
                Box::new(r.bind_context(ctx)),
            ),
            RuleExpr::Or(l, r) => RuleExpr::Or(
                Box::new(l.bind_context(ctx)),
                Box::new(r.bind_context(ctx)),
            ),
            other => other.clone(),
        }
    }

    /// Replace every predicate with a condition that always holds.
    ///
    /// The result admits at least what `self` admits, so it can be pushed
    /// down to a store that cannot run closures, with the exact rule checked
    /// on the rows that come back. Comparisons over a predicate are relaxed
    /// as a whole.
    pub fn relax_predicates(&self) -> Self {
        match self {
            RuleExpr::Predicate(_) => RuleExpr::Everyone,
            RuleExpr::And(l, r) => RuleExpr::And(
                Box::new(l.relax_predicates()),
                Box::new(r.relax_predicates()),
            ),
            RuleExpr::Or(l, r) => RuleExpr::Or(
                Box::new(l.relax_predicates()),
                Box::new(r.relax_predicates()),
            ),
            RuleExpr::Eq(..) | RuleExpr::In(..) if self.has_predicate() => RuleExpr::Everyone,
            other => other.clone(),
        }
    }

    /// Whether any node of this rule is an opaque predicate.
    pub fn has_predicate(&self) -> bool {
        match self {
            RuleExpr::Predicate(_) => true,
            RuleExpr::Eq(l, r) | RuleExpr::And(l, r) | RuleExpr::Or(l, r) => {
                l.has_predicate() || r.has_predicate()
            }
            RuleExpr::In(l, items) => l.has_predicate() || items.iter().any(Self::has_predicate),
            _ => false,
        }
    }

    /// Names of the fields this rule reads.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RuleExpr::Field(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            RuleExpr::Eq(l, r) | RuleExpr::And(l, r) | RuleExpr::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            RuleExpr::In(l, items) => {
                l.collect_fields(out);
                for item in items {
                    item.collect_fields(out);
                }
            }
            _ => {}
        }
    }
}

impl From<Value> for RuleExpr {
    fn from(value: Value) -> Self {
        RuleExpr::Literal(value)
    }
}

impl BitAnd for RuleExpr {
    type Output = RuleExpr;

    fn bitand(self, rhs: RuleExpr) -> RuleExpr {
        self.and(rhs)
    }
}

impl BitOr for RuleExpr {
    type Output = RuleExpr;

    fn bitor(self, rhs: RuleExpr) -> RuleExpr {
        self.or(rhs)
    }
}

impl fmt::Display for RuleExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleExpr::Everyone => f.write_str("EVERYONE"),
            RuleExpr::NoOne => f.write_str("NO_ONE"),
            RuleExpr::Literal(v) => write!(f, "{}", v),
            RuleExpr::Field(name) => write!(f, "field.{}", name),
            RuleExpr::Context(name) => write!(f, "context.{}", name),
            RuleExpr::Eq(l, r) => write!(f, "{} == {}", l, r),
            RuleExpr::In(l, items) => {
                write!(f, "{} IN [", l)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            RuleExpr::And(l, r) => write!(f, "({} AND {})", l, r),
            RuleExpr::Or(l, r) => write!(f, "({} OR {})", l, r),
            RuleExpr::Predicate(_) => f.write_str("<predicate>"),
        }
    }
}
