//! Store trait: the abstract interface for record persistence.
//!
//! The store knows nothing about roles. It persists field maps and applies
//! the context-free filters it is given; permission checks happen above it.

use async_trait::async_trait;
use lockdown_core::{EntityType, FieldMap, RuleExpr, Value};

use crate::error::Result;

/// A listing of one entity type, narrowed by filters.
///
/// Filters must not reference the ambient context; bind them with
/// [`RuleExpr::bind_context`] first. Predicate filters see an empty context.
#[derive(Debug, Clone)]
pub struct Query {
    pub entity_type: EntityType,
    pub filters: Vec<RuleExpr>,
    pub limit: Option<usize>,
}

impl Query {
    /// All rows of `entity_type`.
    pub fn new(entity_type: &EntityType) -> Self {
        Self {
            entity_type: entity_type.clone(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Add a filter; rows must satisfy every filter.
    pub fn filter(mut self, filter: RuleExpr) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The Store trait: async interface for record persistence.
///
/// Rows are field maps keyed by the entity type's primary key.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a new row and return its identity.
    ///
    /// An identity is assigned when the primary key is missing or null.
    async fn insert(&self, entity_type: &EntityType, fields: FieldMap) -> Result<Value>;

    /// Overwrite the given fields of an existing row.
    async fn update(&self, entity_type: &EntityType, id: &Value, fields: FieldMap) -> Result<()>;

    /// Fetch a row by identity.
    async fn get(&self, entity_type: &EntityType, id: &Value) -> Result<Option<FieldMap>>;

    /// Fetch the rows matching `query`, ordered by identity.
    async fn select(&self, query: &Query) -> Result<Vec<FieldMap>>;

    /// Remove a row. Returns whether it existed.
    async fn delete(&self, entity_type: &EntityType, id: &Value) -> Result<bool>;
}
