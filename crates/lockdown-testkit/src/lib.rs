//! # Lockdown Testkit
//!
//! Testing utilities for Lockdown.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a user/group/bicycle schema, a registered memory store,
//!   and the policies the integration tests exercise
//! - **Generators**: Proptest strategies for values, rules, contexts, and
//!   records
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use lockdown_core::check_rule;
//! use lockdown_testkit::generators::{context, record, rule_expr};
//! use lockdown_testkit::fixtures::Schema;
//!
//! proptest! {
//!     #[test]
//!     fn rule_is_stable(rule in rule_expr(), ctx in context(), rec in record(Schema::new().bicycle)) {
//!         prop_assert_eq!(check_rule(&ctx, Some(&rec), &rule), check_rule(&ctx, Some(&rec), &rule));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use lockdown_testkit::fixtures::{group_read_owner_write, TestFixture};
//!
//! let fixture = TestFixture::new();
//! let role = group_read_owner_write(&fixture.schema);
//! assert_eq!(role.name(), "rest_api");
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{Schema, TestFixture};
