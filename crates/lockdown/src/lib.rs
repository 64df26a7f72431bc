//! # Lockdown
//!
//! Declarative, role-based, attribute-aware authorization for records.
//!
//! ## Overview
//!
//! Policies are written once, as data: a [`Role`](core::Role) declares for
//! each entity type who may read, create, write, and delete records, which
//! fields each of those covers, and how field values are validated. Rules
//! compare record fields with values from the ambient [`Context`](core::Context)
//! (the current user, their group, ...). The [`Repository`] applies the
//! active role's rules to every read and write that goes through it.
//!
//! ## Key Concepts
//!
//! - **Rules combine with AND**: every applicable rule of every applicable
//!   rule set must pass. Roles inherit rule sets from their parents, and
//!   entity types from their base type.
//! - **Layers**: writing requires reading, deleting requires writing, and
//!   field access requires record access.
//! - **Reads degrade**: unreadable fields are stripped, not reported.
//! - **Provenance**: a field validated on assignment inside a transaction
//!   scope is not denied again by whichever role is active at save time.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use lockdown::{Repository, RepositoryConfig};
//! use lockdown::core::{Context, EntityType, FieldMap, Role, RuleExpr, Value};
//! use lockdown::store::MemoryStore;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bicycle = EntityType::builder("bicycle").fields(["owner", "serial"]).build();
//!
//! let mut role = Role::new("rest_api");
//! role.lockdown(&bicycle)
//!     .writeable_by(RuleExpr::field("owner").eq(RuleExpr::context("user")));
//!
//! let store = MemoryStore::new().with_type(&bicycle);
//! let repo = Repository::new(store, RepositoryConfig::default());
//!
//! let mut ctx = Context::with_role(Arc::new(role));
//! ctx.set("user", 5);
//!
//! let mut fields = FieldMap::new();
//! fields.insert("owner".into(), Value::from(5));
//! fields.insert("serial".into(), Value::from("abc"));
//! let bike = repo.create(&mut ctx, &bicycle, fields).await.unwrap();
//! assert_eq!(bike.get("id"), &Value::Int(1));
//! # });
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `lockdown::core` - Values, rules, roles, and the ambient context
//! - `lockdown::engine` - Permission decisions and save planning
//! - `lockdown::store` - Storage abstraction

pub mod error;
pub mod repository;

// Re-export component crates
pub use lockdown_core as core;
pub use lockdown_engine as engine;
pub use lockdown_store as store;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use repository::{Repository, RepositoryConfig};

// Re-export commonly used types
pub use lockdown_core::{Context, EntityType, Record, Role, RuleExpr, Value, EVERYONE, NO_ONE};
pub use lockdown_engine::{AccessError, PermissionEngine, SavePlan};
