//! Post-write reconciliation of deferred entries
//!
//! Runs only after the store has confirmed the primary write. Every pending
//! field is read back from the store: key fields land in `key_values`, the
//! rest in `new_values` (a generated value has no meaningful old value).

use super::entry::{AuditRecord, DeferredEntry};
use crate::error::{AuditrailError, AuditrailResult};
use crate::storage::ChangeTracker;

/// Fills deferred entries with store-generated values
pub struct AuditReconciler;

impl AuditReconciler {
    /// Resolve and finalize every deferred entry
    ///
    /// # Errors
    ///
    /// Returns `ReconciliationInvariant` if the store still cannot produce a
    /// generated value. The primary write has already been applied.
    pub fn reconcile<T: ChangeTracker + ?Sized>(
        tracker: &T,
        deferred: Vec<DeferredEntry>,
    ) -> AuditrailResult<Vec<AuditRecord>> {
        let mut records = Vec::with_capacity(deferred.len());

        for deferred in deferred {
            let mut entry = deferred.into_inner();

            for field in std::mem::take(&mut entry.pending_fields) {
                let value = tracker.resolved_value(entry.handle, &field.name).ok_or_else(|| {
                    AuditrailError::ReconciliationInvariant {
                        entity_kind: entry.entity_kind.clone(),
                        field: field.name.clone(),
                    }
                })?;

                if field.is_key {
                    entry.key_values.insert(field.name, value);
                } else {
                    entry.new_values.insert(field.name, value);
                }
            }

            records.push(entry.finalize());
        }

        tracing::debug!(reconciled = records.len(), "reconciled deferred audit entries");

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::OperationKind;
    use crate::audit::testing::{added, mutation, pending, pending_key, FakeStore};
    use crate::audit::ChangeScanner;
    use crate::models::ActorContext;
    use crate::storage::{EntityState, Store};
    use serde_json::json;

    fn actor() -> ActorContext {
        ActorContext::new("user-1", "POST")
    }

    #[test]
    fn test_generated_key_filled_after_write() {
        let mut store = FakeStore::new(vec![mutation(
            0,
            "Product",
            EntityState::Added,
            vec![pending_key("id"), added("name", json!("x"))],
        )])
        .generates(0, "id", json!(42));

        let outcome = ChangeScanner::default().scan(&store, &actor());
        assert!(outcome.ready.is_empty());
        assert!(outcome.deferred[0].entry().key_values.is_empty());

        store.commit().unwrap();
        let records = AuditReconciler::reconcile(&store, outcome.deferred).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.operation(), OperationKind::Create);
        assert_eq!(record.key_values().len(), 1);
        assert_eq!(record.key_values()["id"], json!(42));
        assert_eq!(record.new_values().len(), 1);
        assert_eq!(record.new_values()["name"], json!("x"));
        assert!(record.old_values().is_empty());
    }

    #[test]
    fn test_generated_plain_field_goes_to_new_values() {
        let mut store = FakeStore::new(vec![mutation(
            0,
            "Product",
            EntityState::Added,
            vec![pending_key("id"), added("name", json!("x")), pending("created_at")],
        )])
        .generates(0, "id", json!(1))
        .generates(0, "created_at", json!("2026-10-17T00:00:00Z"));

        let outcome = ChangeScanner::default().scan(&store, &actor());
        store.commit().unwrap();
        let records = AuditReconciler::reconcile(&store, outcome.deferred).unwrap();

        let record = &records[0];
        assert_eq!(record.new_values()["created_at"], json!("2026-10-17T00:00:00Z"));
        assert!(!record.key_values().contains_key("created_at"));
        assert!(!record.old_values().contains_key("created_at"));
    }

    #[test]
    fn test_unresolved_value_is_invariant_violation() {
        let mut store = FakeStore::new(vec![mutation(
            0,
            "Product",
            EntityState::Added,
            vec![pending_key("id"), added("name", json!("x"))],
        )]);

        let outcome = ChangeScanner::default().scan(&store, &actor());
        store.commit().unwrap();

        let err = AuditReconciler::reconcile(&store, outcome.deferred).unwrap_err();
        assert!(err.is_reconciliation_invariant());
        assert!(err.to_string().contains("Product.id"));
    }

    #[test]
    fn test_nothing_deferred() {
        let store = FakeStore::default();
        assert!(AuditReconciler::reconcile(&store, Vec::new()).unwrap().is_empty());
    }
}
