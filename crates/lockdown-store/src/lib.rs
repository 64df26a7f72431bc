//! # Lockdown Store
//!
//! Storage abstraction for Lockdown-secured records. Provides a trait-based
//! interface for record persistence and an in-memory implementation.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`MemoryStore`] - In-memory storage for tests and examples
//! - [`Query`] - A filtered listing of one entity type
//!
//! ## Usage
//!
//! ```rust
//! use lockdown_core::{EntityType, FieldMap, RuleExpr, Value};
//! use lockdown_store::{MemoryStore, Query, Store};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let bicycle = EntityType::builder("bicycle").field("group").build();
//! let store = MemoryStore::new().with_type(&bicycle);
//!
//! let mut fields = FieldMap::new();
//! fields.insert("group".into(), Value::from(7));
//! let id = store.insert(&bicycle, fields).await.unwrap();
//!
//! let query = Query::new(&bicycle).filter(RuleExpr::field("group").eq(RuleExpr::literal(7)));
//! assert_eq!(store.select(&query).await.unwrap().len(), 1);
//! # let _ = id;
//! # });
//! ```

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use traits::{Query, Store};
