//! # Lockdown Engine
//!
//! Entity-facing permission decisions built on the rule model in
//! `lockdown-core`.
//!
//! ## Overview
//!
//! The [`PermissionEngine`] asks the active role for the rule sets that apply
//! to an entity's type, evaluates the relevant rule of each, and combines the
//! results with AND semantics. On top of the record and field decisions it
//! provides the operations a storage layer needs:
//!
//! - **Materialization**: strip unreadable fields from a loaded record
//! - **Assignment**: check, validate, and record provenance for a field write
//! - **Save planning**: reduce a save to the fields the caller may persist
//! - **Query predicates**: the read rule to inject into a listing
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lockdown_core::{Context, EntityType, Record, Role, RuleExpr};
//! use lockdown_engine::PermissionEngine;
//!
//! let bicycle = EntityType::builder("bicycle").fields(["owner", "group"]).build();
//! let mut role = Role::new("rest_api");
//! role.lockdown(&bicycle)
//!     .readable_by(RuleExpr::field("group").eq(RuleExpr::context("group")));
//!
//! let mut ctx = Context::with_role(Arc::new(role));
//! let record = Record::new(&bicycle).with("id", 1).with("group", 7);
//!
//! let engine = PermissionEngine::default();
//! assert!(!engine.is_readable(&ctx, &record, None));
//! ctx.set("group", 7);
//! assert!(engine.is_readable(&ctx, &record, None));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod fields;
pub mod save;

pub use config::{EngineConfig, ValidationPolicy};
pub use engine::PermissionEngine;
pub use error::{AccessError, Result};
pub use save::SavePlan;
