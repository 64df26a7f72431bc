//! Test fixtures and helpers.
//!
//! A small schema of users, groups, and bicycles, with the policies the
//! integration tests exercise.

use std::sync::Arc;

use lockdown_core::{EntityType, FieldMap, Role, RuleExpr, Value, NO_ONE};
use lockdown_store::{MemoryStore, Store};

/// The entity types used across the tests.
///
/// `bicycle` extends `vehicle`, which declares the `owner` and `group`
/// relations; `bicycle` adds `serial`.
#[derive(Debug, Clone)]
pub struct Schema {
    pub user: EntityType,
    pub group: EntityType,
    pub vehicle: EntityType,
    pub bicycle: EntityType,
}

impl Schema {
    pub fn new() -> Self {
        let user = EntityType::builder("user").field("username").build();
        let group = EntityType::builder("group").field("name").build();
        let vehicle = EntityType::builder("vehicle")
            .fields(["owner", "group"])
            .build();
        let bicycle = EntityType::builder("bicycle")
            .field("serial")
            .extends(&vehicle)
            .build();
        Self {
            user,
            group,
            vehicle,
            bicycle,
        }
    }

    /// Every type, for store registration.
    pub fn all(&self) -> [&EntityType; 4] {
        [&self.user, &self.group, &self.vehicle, &self.bicycle]
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// A test fixture with the schema and a memory store it is registered in.
pub struct TestFixture {
    pub schema: Schema,
    pub store: MemoryStore,
}

impl TestFixture {
    /// Create a new test fixture with an empty store.
    pub fn new() -> Self {
        let schema = Schema::new();
        let mut store = MemoryStore::new();
        for entity_type in schema.all() {
            store.register(entity_type);
        }
        Self { schema, store }
    }

    /// Insert a user directly, bypassing permission checks.
    pub async fn create_user(&self, username: &str) -> Value {
        let mut fields = FieldMap::new();
        fields.insert("username".into(), Value::from(username));
        self.insert(&self.schema.user, fields).await
    }

    /// Insert a group directly, bypassing permission checks.
    pub async fn create_group(&self, name: &str) -> Value {
        let mut fields = FieldMap::new();
        fields.insert("name".into(), Value::from(name));
        self.insert(&self.schema.group, fields).await
    }

    /// Insert a bicycle owned by `owner` in `group`, bypassing permission
    /// checks. Both are identities as returned by the other constructors.
    pub async fn create_bicycle(
        &self,
        owner: &Value,
        group: &Value,
        serial: Option<&str>,
    ) -> Value {
        let mut fields = FieldMap::new();
        fields.insert("owner".into(), Value::reference("user", owner.clone()));
        fields.insert("group".into(), Value::reference("group", group.clone()));
        if let Some(serial) = serial {
            fields.insert("serial".into(), Value::from(serial));
        }
        self.insert(&self.schema.bicycle, fields).await
    }

    async fn insert(&self, entity_type: &EntityType, fields: FieldMap) -> Value {
        self.store
            .insert(entity_type, fields)
            .await
            .expect("fixture insert")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policies
// ─────────────────────────────────────────────────────────────────────────────

/// `entity.group == context.group`
pub fn same_group() -> RuleExpr {
    RuleExpr::field("group").eq(RuleExpr::context("group"))
}

/// `entity.owner == context.user`
pub fn is_owner() -> RuleExpr {
    RuleExpr::field("owner").eq(RuleExpr::context("user"))
}

/// Bicycles readable within their group and writable by their owner.
pub fn group_read_owner_write(schema: &Schema) -> Arc<Role> {
    let mut role = Role::new("rest_api");
    role.lockdown(&schema.bicycle)
        .readable_by(same_group())
        .writeable_by(is_owner());
    Arc::new(role)
}

/// The serial number readable within the group and writable by the owner;
/// the rest of the bicycle unconstrained.
pub fn serial_policy(schema: &Schema) -> Arc<Role> {
    let mut role = Role::new("rest_api");
    role.lockdown(&schema.bicycle)
        .field_readable_by("serial", same_group())
        .field_writeable_by("serial", is_owner());
    Arc::new(role)
}

/// Bicycles nobody may read or write.
pub fn locked(schema: &Schema) -> Arc<Role> {
    let mut role = Role::new("rest_api");
    role.lockdown(&schema.bicycle)
        .readable_by(NO_ONE)
        .writeable_by(NO_ONE);
    Arc::new(role)
}

/// Two roles that may each write only one of `serial` and `group`.
pub fn split_writers(schema: &Schema) -> (Arc<Role>, Arc<Role>) {
    let mut serial_writer = Role::new("serial_writer");
    serial_writer
        .lockdown(&schema.bicycle)
        .field_writeable_by("group", NO_ONE);

    let mut group_writer = Role::new("group_writer");
    group_writer
        .lockdown(&schema.bicycle)
        .field_writeable_by("serial", NO_ONE);

    (Arc::new(serial_writer), Arc::new(group_writer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_inheritance() {
        let schema = Schema::new();
        assert_eq!(schema.bicycle.base(), Some(&schema.vehicle));
        assert_eq!(schema.bicycle.fields(), vec!["id", "owner", "group", "serial"]);
    }

    #[tokio::test]
    async fn test_fixture_inserts() {
        let fixture = TestFixture::new();
        let user = fixture.create_user("test").await;
        let group = fixture.create_group("test").await;
        let bike = fixture.create_bicycle(&user, &group, Some("1")).await;

        let row = fixture
            .store
            .get(&fixture.schema.bicycle, &bike)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row["owner"], Value::reference("user", 1));
        assert_eq!(row["serial"], Value::from("1"));
    }
}
