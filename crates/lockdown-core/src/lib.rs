//! # Lockdown Core
//!
//! Pure primitives for Lockdown: values, rule expressions, rule sets, roles,
//! and the ambient context.
//!
//! This crate contains no I/O and no storage. Everything here is plain
//! computation over in-memory policy structures.
//!
//! ## Key Types
//!
//! - [`RuleExpr`] - Expression tree used inside rules
//! - [`RuleSet`] - The rules one role declares for one entity type
//! - [`Role`] - Named policy scope with parent roles
//! - [`Context`] - Request-scoped role, variables and transaction depth
//! - [`Entity`] - The record capability the engine consumes
//!
//! ## Evaluation
//!
//! Rules are evaluated by [`check_rule`]. See the [`evaluator`] module for
//! null handling.
//!
//! ## Threading
//!
//! [`Role`], [`RuleSet`] and [`RuleExpr`] are immutable once built and are
//! `Send + Sync`; share them behind `Arc`. A [`Context`] belongs to one task.

pub mod context;
pub mod entity;
pub mod error;
pub mod evaluator;
pub mod provenance;
pub mod role;
pub mod rule;
pub mod ruleset;
pub mod value;

pub use context::{Context, TransactionGuard};
pub use entity::{Entity, EntityType, EntityTypeBuilder, FieldMap, Record, DEFAULT_PRIMARY_KEY};
pub use error::{CoreError, Result};
pub use evaluator::{check_rule, check_validation, resolve};
pub use provenance::{Provenance, ProvenanceEntry};
pub use role::Role;
pub use rule::{Predicate, PredicateInput, RuleExpr, EVERYONE, NO_ONE};
pub use ruleset::RuleSet;
pub use value::Value;
