//! The Repository: permission-checked access to a store.
//!
//! Every record that leaves the repository has been through read filtering,
//! and every write has been through the save planner.

use std::sync::Arc;

use tracing::{debug, trace};

use lockdown_core::{check_rule, Context, Entity, EntityType, FieldMap, Record, RuleExpr, Value};
use lockdown_engine::{AccessError, EngineConfig, PermissionEngine, SavePlan};
use lockdown_store::{Query, Store, StoreError};

use crate::error::{Error, Result};

/// Configuration for the Repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Engine configuration.
    pub engine: EngineConfig,
    /// Forget change provenance once a save has been persisted.
    pub clear_provenance_on_save: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            clear_provenance_on_save: true,
        }
    }
}

/// Records from a [`Store`], seen through the active [`Context`].
///
/// Provides:
/// - Listings narrowed to readable records, with unreadable fields stripped
/// - Lookups by identity
/// - Checked creation, saving, and deletion
pub struct Repository<S: Store> {
    store: Arc<S>,
    engine: PermissionEngine,
    config: RepositoryConfig,
}

impl<S: Store> Repository<S> {
    /// Create a new repository over `store`.
    pub fn new(store: S, config: RepositoryConfig) -> Self {
        Self {
            store: Arc::new(store),
            engine: PermissionEngine::new(config.engine.clone()),
            config,
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Every record of `entity_type` the context may read.
    pub async fn select(&self, ctx: &Context, entity_type: &EntityType) -> Result<Vec<Record>> {
        self.select_where(ctx, Query::new(entity_type)).await
    }

    /// The records matching `query` that the context may read.
    ///
    /// The read predicate is added to the query's filters and every filter
    /// is bound to the context before reaching the store. Predicates cannot
    /// be pushed down, so the store sees a widened filter and the rows it
    /// returns are checked again here: rows failing a caller filter or
    /// turning out unreadable are skipped. The limit is applied to the
    /// readable rows, and only forwarded to the store when its filters are
    /// exact.
    pub async fn select_where(&self, ctx: &Context, query: Query) -> Result<Vec<Record>> {
        let Query {
            entity_type,
            filters,
            limit,
        } = query;
        let read = self.engine.read_predicate(ctx, &entity_type);
        let widened = filters
            .iter()
            .chain(read.as_ref())
            .any(RuleExpr::has_predicate);

        let store_query = Query {
            entity_type: entity_type.clone(),
            filters: filters
                .iter()
                .chain(read.as_ref())
                .map(|filter| filter.bind_context(ctx).relax_predicates())
                .collect(),
            limit: if widened { None } else { limit },
        };

        let rows = self.store.select(&store_query).await?;
        let mut records = Vec::new();
        for row in rows {
            if limit.is_some_and(|limit| records.len() >= limit) {
                break;
            }
            let mut record = Record::from_fields(&entity_type, row);
            if !filters.iter().all(|filter| check_rule(ctx, Some(&record), filter)) {
                trace!(entity_type = %entity_type, "skipping filtered row");
                continue;
            }
            match self.engine.materialize(ctx, &mut record) {
                Ok(_) => records.push(record),
                Err(AccessError::NotReadable { .. }) => {
                    trace!(entity_type = %entity_type, "skipping unreadable row");
                }
                Err(err) => return Err(err.into()),
            }
        }

        debug!(entity_type = %entity_type, count = records.len(), "select");
        Ok(records)
    }

    /// The record of `entity_type` with identity `id`.
    ///
    /// Fails with [`Error::NotFound`] if no such row exists and with
    /// [`AccessError::NotReadable`] if the context may not read it.
    pub async fn get(
        &self,
        ctx: &Context,
        entity_type: &EntityType,
        id: impl Into<Value>,
    ) -> Result<Record> {
        let id = id.into();
        let row = self
            .store
            .get(entity_type, &id)
            .await?
            .ok_or_else(|| Error::NotFound {
                entity_type: entity_type.name().to_string(),
                id: id.to_string(),
            })?;

        let mut record = Record::from_fields(entity_type, row);
        self.engine.materialize(ctx, &mut record)?;
        Ok(record)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Assign `field` on `record` through the engine's checks.
    pub fn set_field(
        &self,
        ctx: &Context,
        record: &mut dyn Entity,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<()> {
        self.engine.set_field(ctx, record, field, value)?;
        Ok(())
    }

    /// Build a new record from `fields` and save it.
    ///
    /// Fields are assigned inside a transaction scope, so each is checked and
    /// validated as it is set; the first failure aborts the creation.
    pub async fn create(
        &self,
        ctx: &mut Context,
        entity_type: &EntityType,
        fields: FieldMap,
    ) -> Result<Record> {
        let mut record = Record::new(entity_type);
        {
            let tx = ctx.enter_transaction();
            for (field, value) in fields {
                self.engine.set_field(&tx, &mut record, &field, value)?;
            }
        }

        self.save(ctx, &mut record, None).await?;
        Ok(record)
    }

    /// Persist `record`, or the fields named in `only`.
    ///
    /// Only the fields the save planner accepts are written. A new record
    /// receives its identity from the store. Returns the plan that was
    /// applied.
    pub async fn save(
        &self,
        ctx: &Context,
        record: &mut dyn Entity,
        only: Option<&[&str]>,
    ) -> Result<SavePlan> {
        let plan = self.engine.prepare_save(ctx, &*record, only)?;
        let entity_type = record.entity_type().clone();

        if plan.is_new {
            let id = self.store.insert(&entity_type, plan.fields.clone()).await?;
            debug!(entity_type = %entity_type, id = %id, "created");
            record.put_field(entity_type.primary_key(), id);
        } else if !plan.is_empty() {
            let id = record
                .identity()
                .cloned()
                .ok_or_else(|| StoreError::MissingIdentity(entity_type.name().to_string()))?;
            self.store
                .update(&entity_type, &id, plan.fields.clone())
                .await?;
            debug!(entity_type = %entity_type, id = %id, fields = plan.fields.len(), "saved");
        }

        if self.config.clear_provenance_on_save {
            record.provenance_mut().clear();
        }
        Ok(plan)
    }

    /// Delete `record`. Returns whether a row was removed.
    pub async fn delete(&self, ctx: &Context, record: &dyn Entity) -> Result<bool> {
        self.engine.ensure_deletable(ctx, record)?;
        let id = record
            .identity()
            .cloned()
            .ok_or_else(|| StoreError::MissingIdentity(record.entity_type().name().to_string()))?;

        let removed = self.store.delete(record.entity_type(), &id).await?;
        debug!(entity_type = %record.entity_type(), id = %id, removed, "delete");
        Ok(removed)
    }
}
