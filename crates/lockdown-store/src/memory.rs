//! In-memory implementation of the Store trait.
//!
//! Primarily for tests and examples. Rows live in ordered maps per entity
//! type; nothing is persisted.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use lockdown_core::{check_rule, Context, EntityType, FieldMap, Record, Value};

use crate::error::{Result, StoreError};
use crate::traits::{Query, Store};

/// In-memory store implementation.
///
/// Entity types must be registered before use. Identities are integers or
/// strings; integer identities are assigned from a per-type counter.
pub struct MemoryStore {
    inner: RwLock<HashMap<String, Table>>,
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<RowKey, FieldMap>,
    next_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Int(i64),
    Text(String),
}

impl RowKey {
    fn from_value(entity_type: &EntityType, id: &Value) -> Result<Self> {
        match id.reduce() {
            Value::Int(i) => Ok(RowKey::Int(*i)),
            Value::Text(s) => Ok(RowKey::Text(s.clone())),
            Value::Null => Err(StoreError::MissingIdentity(entity_type.name().to_string())),
            other => Err(StoreError::InvalidData(format!(
                "{} cannot be an identity of {}",
                other, entity_type
            ))),
        }
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Make `entity_type` storable. Registering twice keeps existing rows.
    pub fn register(&mut self, entity_type: &EntityType) {
        self.inner
            .get_mut()
            .entry(entity_type.name().to_string())
            .or_default();
    }

    /// Builder-style [`register`](Self::register).
    pub fn with_type(mut self, entity_type: &EntityType) -> Self {
        self.register(entity_type);
        self
    }

    /// Number of rows stored for `entity_type`.
    pub async fn len(&self, entity_type: &EntityType) -> usize {
        let inner = self.inner.read().await;
        inner
            .get(entity_type.name())
            .map_or(0, |table| table.rows.len())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_fields(entity_type: &EntityType, fields: &FieldMap) -> Result<()> {
    match fields.keys().find(|field| !entity_type.has_field(field)) {
        Some(field) => Err(StoreError::InvalidData(format!(
            "{} has no field {}",
            entity_type, field
        ))),
        None => Ok(()),
    }
}

fn unknown(entity_type: &EntityType) -> StoreError {
    StoreError::UnknownEntityType(entity_type.name().to_string())
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert(&self, entity_type: &EntityType, mut fields: FieldMap) -> Result<Value> {
        check_fields(entity_type, &fields)?;
        let mut inner = self.inner.write().await;
        let table = inner
            .get_mut(entity_type.name())
            .ok_or_else(|| unknown(entity_type))?;

        let primary_key = entity_type.primary_key();
        let id = match fields.get(primary_key).map(Value::reduce) {
            None | Some(Value::Null) => {
                table.next_id = table.next_id.checked_add(1).ok_or_else(|| {
                    StoreError::InvalidData(format!("no identity left for {entity_type}"))
                })?;
                Value::Int(table.next_id)
            }
            Some(given) => given.clone(),
        };

        let key = RowKey::from_value(entity_type, &id)?;
        if table.rows.contains_key(&key) {
            return Err(StoreError::Conflict {
                entity_type: entity_type.name().to_string(),
                id: id.to_string(),
            });
        }
        if let RowKey::Int(i) = key {
            table.next_id = table.next_id.max(i);
        }

        fields.insert(primary_key.to_string(), id.clone());
        table.rows.insert(key, fields);
        trace!(entity_type = %entity_type, id = %id, "inserted");
        Ok(id)
    }

    async fn update(&self, entity_type: &EntityType, id: &Value, fields: FieldMap) -> Result<()> {
        check_fields(entity_type, &fields)?;
        let key = RowKey::from_value(entity_type, id)?;
        let mut inner = self.inner.write().await;
        let table = inner
            .get_mut(entity_type.name())
            .ok_or_else(|| unknown(entity_type))?;

        let row = table.rows.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            entity_type: entity_type.name().to_string(),
            id: id.to_string(),
        })?;

        let primary_key = entity_type.primary_key();
        for (field, value) in fields {
            if field != primary_key {
                row.insert(field, value);
            }
        }
        trace!(entity_type = %entity_type, id = %id, "updated");
        Ok(())
    }

    async fn get(&self, entity_type: &EntityType, id: &Value) -> Result<Option<FieldMap>> {
        let key = RowKey::from_value(entity_type, id)?;
        let inner = self.inner.read().await;
        let table = inner
            .get(entity_type.name())
            .ok_or_else(|| unknown(entity_type))?;
        Ok(table.rows.get(&key).cloned())
    }

    async fn select(&self, query: &Query) -> Result<Vec<FieldMap>> {
        let inner = self.inner.read().await;
        let table = inner
            .get(query.entity_type.name())
            .ok_or_else(|| unknown(&query.entity_type))?;

        let unbound = Context::new();
        let limit = query.limit.unwrap_or(usize::MAX);
        let rows: Vec<FieldMap> = table
            .rows
            .values()
            .filter(|fields| {
                let row = Record::from_fields(&query.entity_type, (*fields).clone());
                query
                    .filters
                    .iter()
                    .all(|filter| check_rule(&unbound, Some(&row), filter))
            })
            .take(limit)
            .cloned()
            .collect();

        trace!(
            entity_type = %query.entity_type,
            filters = query.filters.len(),
            rows = rows.len(),
            "selected"
        );
        Ok(rows)
    }

    async fn delete(&self, entity_type: &EntityType, id: &Value) -> Result<bool> {
        let key = RowKey::from_value(entity_type, id)?;
        let mut inner = self.inner.write().await;
        let table = inner
            .get_mut(entity_type.name())
            .ok_or_else(|| unknown(entity_type))?;
        Ok(table.rows.remove(&key).is_some())
    }
}
