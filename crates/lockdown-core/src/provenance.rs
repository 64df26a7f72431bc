//! Per-record change provenance.
//!
//! Records which role assigned each field, so that a field checked at
//! assignment time inside a transaction scope is not rejected again at save
//! time by whichever role happens to be active then.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::role::Role;

/// Who set a field and under what conditions.
#[derive(Debug, Clone)]
pub struct ProvenanceEntry {
    /// The role active when the field was assigned.
    pub role: Arc<Role>,
    /// Whether the assignment was checked inside a transaction scope.
    pub in_transaction: bool,
}

/// Change provenance for one record instance.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    entries: BTreeMap<String, ProvenanceEntry>,
}

impl Provenance {
    /// Record the most recent assignment of `field`.
    pub fn record(&mut self, field: impl Into<String>, role: Arc<Role>, in_transaction: bool) {
        self.entries.insert(
            field.into(),
            ProvenanceEntry {
                role,
                in_transaction,
            },
        );
    }

    /// Provenance of `field`, if it was assigned while a role was active.
    pub fn get(&self, field: &str) -> Option<&ProvenanceEntry> {
        self.entries.get(field)
    }

    /// Whether `field` was checked at assignment time inside a transaction.
    pub fn is_validated(&self, field: &str) -> bool {
        self.entries.get(field).map_or(false, |e| e.in_transaction)
    }

    /// Drop the entry for `field`.
    pub fn forget(&mut self, field: &str) {
        self.entries.remove(field);
    }

    /// Drop all entries (after the record has been persisted).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate `(field, entry)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProvenanceEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_validate() {
        let role = Arc::new(Role::new("editor"));
        let mut provenance = Provenance::default();

        provenance.record("serial", Arc::clone(&role), true);
        provenance.record("color", role, false);

        assert!(provenance.is_validated("serial"));
        assert!(!provenance.is_validated("color"));
        assert!(!provenance.is_validated("owner"));
        assert_eq!(provenance.get("serial").unwrap().role.name(), "editor");
    }

    #[test]
    fn test_latest_assignment_wins() {
        let first = Arc::new(Role::new("first"));
        let second = Arc::new(Role::new("second"));
        let mut provenance = Provenance::default();

        provenance.record("serial", first, true);
        provenance.record("serial", second, false);

        let entry = provenance.get("serial").unwrap();
        assert_eq!(entry.role.name(), "second");
        assert!(!entry.in_transaction);
        assert_eq!(provenance.len(), 1);
    }

    #[test]
    fn test_clear() {
        let mut provenance = Provenance::default();
        provenance.record("serial", Arc::new(Role::new("r")), true);
        provenance.clear();
        assert!(provenance.is_empty());
    }
}
