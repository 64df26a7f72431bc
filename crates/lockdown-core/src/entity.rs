//! Entity types and the record capability consumed by the engine.
//!
//! The engine never owns a schema. It reads what it needs through
//! [`EntityType`] (name, fields, primary key, base type) and through the
//! [`Entity`] trait (field get/set, identity, change provenance).

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::provenance::Provenance;
use crate::value::Value;

/// Field values keyed by field name.
pub type FieldMap = BTreeMap<String, Value>;

/// Default primary key field name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Handle to an entity type descriptor.
///
/// Cheap to clone. Two handles are equal when their names are equal, so a
/// type name must be unique within one policy.
#[derive(Clone)]
pub struct EntityType(Arc<TypeInfo>);

struct TypeInfo {
    name: String,
    primary_key: String,
    fields: Vec<String>,
    base: Option<EntityType>,
}

impl EntityType {
    /// Start describing a new entity type.
    pub fn builder(name: impl Into<String>) -> EntityTypeBuilder {
        EntityTypeBuilder {
            name: name.into(),
            primary_key: None,
            fields: Vec::new(),
            base: None,
        }
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The primary key field name.
    pub fn primary_key(&self) -> &str {
        &self.0.primary_key
    }

    /// The base type whose rules also apply to this type.
    pub fn base(&self) -> Option<&EntityType> {
        self.0.base.as_ref()
    }

    /// All fields, inherited ones first, then the ones declared on this type.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = match self.base() {
            Some(base) => base.fields(),
            None => Vec::new(),
        };
        for field in &self.0.fields {
            if !fields.contains(&field.as_str()) {
                fields.push(field);
            }
        }
        fields
    }

    /// Whether `field` is declared on this type or any base type.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.fields.iter().any(|f| f == field)
            || self.base().map_or(false, |base| base.has_field(field))
    }

    /// Iterate this type followed by its base types, nearest first.
    pub fn ancestry(&self) -> impl Iterator<Item = &EntityType> {
        std::iter::successors(Some(self), |ty| ty.base())
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name())
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for [`EntityType`].
#[derive(Debug)]
pub struct EntityTypeBuilder {
    name: String,
    primary_key: Option<String>,
    fields: Vec<String>,
    base: Option<EntityType>,
}

impl EntityTypeBuilder {
    /// Set the primary key field. Defaults to the base type's key, or `id`.
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Declare a field.
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Declare several fields.
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Inherit from a base type.
    pub fn extends(mut self, base: &EntityType) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Finish the descriptor. The primary key is always a declared field.
    pub fn build(self) -> EntityType {
        let primary_key = self
            .primary_key
            .or_else(|| self.base.as_ref().map(|b| b.primary_key().to_string()))
            .unwrap_or_else(|| DEFAULT_PRIMARY_KEY.to_string());

        let mut fields = self.fields;
        let inherited = self
            .base
            .as_ref()
            .map_or(false, |b| b.has_field(&primary_key));
        if !inherited && !fields.contains(&primary_key) {
            fields.insert(0, primary_key.clone());
        }

        EntityType(Arc::new(TypeInfo {
            name: self.name,
            primary_key,
            fields,
            base: self.base,
        }))
    }
}

/// The capability a record exposes to the permission engine.
///
/// Implemented by [`Record`]; storage layers with their own row types can
/// implement it directly.
pub trait Entity {
    /// The record's type.
    fn entity_type(&self) -> &EntityType;

    /// Current value of `field`, or `None` if it is not populated.
    fn field(&self, field: &str) -> Option<&Value>;

    /// Assign `field` without any checks.
    fn put_field(&mut self, field: &str, value: Value);

    /// Remove `field` from the populated set, returning the old value.
    fn take_field(&mut self, field: &str) -> Option<Value>;

    /// Names of the currently populated fields.
    fn populated_fields(&self) -> Vec<String>;

    /// Change provenance of this instance.
    fn provenance(&self) -> &Provenance;

    /// Mutable change provenance of this instance.
    fn provenance_mut(&mut self) -> &mut Provenance;

    /// Keep a copy of field values as loaded, before read filtering.
    ///
    /// The default implementation discards it.
    fn retain_raw(&mut self, _raw: FieldMap) {}

    /// The primary key value, if set and non-null.
    fn identity(&self) -> Option<&Value> {
        self.field(self.entity_type().primary_key())
            .filter(|v| !v.reduce().is_null())
    }

    /// Whether the record has been persisted (has an identity).
    fn is_persisted(&self) -> bool {
        self.identity().is_some()
    }

    /// Snapshot of the populated field values.
    fn field_values(&self) -> FieldMap {
        self.populated_fields()
            .into_iter()
            .filter_map(|name| self.field(&name).cloned().map(|v| (name, v)))
            .collect()
    }
}

/// A generic record: an entity type plus a map of field values.
#[derive(Debug, Clone)]
pub struct Record {
    entity_type: EntityType,
    data: FieldMap,
    raw: Option<FieldMap>,
    provenance: Provenance,
}

impl Record {
    /// Create an empty (unpersisted) record.
    pub fn new(entity_type: &EntityType) -> Self {
        Self {
            entity_type: entity_type.clone(),
            data: FieldMap::new(),
            raw: None,
            provenance: Provenance::default(),
        }
    }

    /// Create a record from stored values. No checks are applied.
    pub fn from_fields(entity_type: &EntityType, data: FieldMap) -> Self {
        Self {
            entity_type: entity_type.clone(),
            data,
            raw: None,
            provenance: Provenance::default(),
        }
    }

    /// Builder-style trusted assignment, for fixtures and loaders.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(field.into(), value.into());
        self
    }

    /// Value of `field`, `Null` when not populated.
    pub fn get(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.data.get(field).unwrap_or(&NULL)
    }

    /// The populated values.
    pub fn data(&self) -> &FieldMap {
        &self.data
    }

    /// Values as loaded from storage before read filtering, if materialized.
    pub fn raw(&self) -> Option<&FieldMap> {
        self.raw.as_ref()
    }

    /// A reference value pointing at this record.
    pub fn to_ref(&self) -> Value {
        Value::Ref {
            entity_type: self.entity_type.name().to_string(),
            id: Box::new(self.identity().cloned().unwrap_or(Value::Null)),
        }
    }
}

impl Entity for Record {
    fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    fn field(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    fn put_field(&mut self, field: &str, value: Value) {
        self.data.insert(field.to_string(), value);
    }

    fn take_field(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    fn populated_fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn provenance_mut(&mut self) -> &mut Provenance {
        &mut self.provenance
    }

    fn retain_raw(&mut self, raw: FieldMap) {
        self.raw = Some(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicle() -> EntityType {
        EntityType::builder("vehicle").fields(["owner", "group"]).build()
    }

    #[test]
    fn test_fields_include_base_first() {
        let bicycle = EntityType::builder("bicycle")
            .field("serial")
            .extends(&vehicle())
            .build();

        assert_eq!(bicycle.fields(), vec!["id", "owner", "group", "serial"]);
        assert!(bicycle.has_field("owner"));
        assert!(!bicycle.has_field("wheels"));
        assert_eq!(bicycle.primary_key(), "id");
    }

    #[test]
    fn test_ancestry_nearest_first() {
        let base = vehicle();
        let bicycle = EntityType::builder("bicycle").extends(&base).build();
        let names: Vec<_> = bicycle.ancestry().map(|t| t.name()).collect();
        assert_eq!(names, vec!["bicycle", "vehicle"]);
    }

    #[test]
    fn test_custom_primary_key() {
        let ty = EntityType::builder("user").primary_key("uid").build();
        assert_eq!(ty.fields(), vec!["uid"]);

        let record = Record::new(&ty).with("uid", 3);
        assert_eq!(record.identity(), Some(&Value::Int(3)));
    }

    #[test]
    fn test_identity_ignores_null() {
        let ty = vehicle();
        let record = Record::new(&ty).with("id", Value::Null);
        assert!(record.identity().is_none());
        assert!(!record.is_persisted());
    }

    #[test]
    fn test_record_to_ref() {
        let ty = vehicle();
        let record = Record::new(&ty).with("id", 5);
        assert_eq!(record.to_ref(), Value::reference("vehicle", 5));
    }

    #[test]
    fn test_type_equality_by_name() {
        assert_eq!(vehicle(), vehicle());
    }
}
