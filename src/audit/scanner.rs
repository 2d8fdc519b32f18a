//! Change scanner
//!
//! Walks the pending mutations of a unit of work at commit time, classifies
//! each one, records key, old and new values, and splits the resulting
//! entries into ready records and entries deferred until the store has
//! generated their missing values.

use super::codec::ValueCodec;
use super::entry::{AuditRecord, CapturedChange, ChangeEntry, DeferredEntry, OperationKind, PendingField};
use crate::config::Settings;
use crate::models::{ActorContext, SOFT_DELETE_METHOD};
use crate::storage::{ChangeTracker, EntityState, TrackedMutation};

/// Output of a scan: finalized records plus entries awaiting reconciliation
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub ready: Vec<AuditRecord>,
    pub deferred: Vec<DeferredEntry>,
}

impl ScanOutcome {
    /// Whether the scan captured nothing at all
    pub fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.deferred.is_empty()
    }
}

/// Classifies tracked mutations into change entries
#[derive(Debug, Clone)]
pub struct ChangeScanner {
    audit_entity_kind: String,
    soft_delete_method: String,
}

impl Default for ChangeScanner {
    fn default() -> Self {
        Self::new("AuditLog", SOFT_DELETE_METHOD)
    }
}

impl ChangeScanner {
    /// Create a scanner
    ///
    /// `audit_entity_kind` is never audited; a modification committed with
    /// `soft_delete_method` is recorded as a delete.
    pub fn new(audit_entity_kind: impl Into<String>, soft_delete_method: impl Into<String>) -> Self {
        Self {
            audit_entity_kind: audit_entity_kind.into(),
            soft_delete_method: soft_delete_method.into(),
        }
    }

    /// Create a scanner configured from settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.audit_entity_kind, &settings.soft_delete_method)
    }

    /// Map a lifecycle state to the audited operation
    ///
    /// Returns `None` for states that are never audited.
    pub fn classify(&self, state: EntityState, method: &str) -> Option<OperationKind> {
        match state {
            EntityState::Added => Some(OperationKind::Create),
            EntityState::Deleted => Some(OperationKind::Delete),
            EntityState::Modified if method == self.soft_delete_method => Some(OperationKind::Delete),
            EntityState::Modified => Some(OperationKind::Update),
            EntityState::Unchanged | EntityState::Detached => None,
        }
    }

    /// Capture one mutation
    ///
    /// Returns `None` for unaudited states and for the audit record kind.
    pub fn capture(&self, mutation: &TrackedMutation, actor: &ActorContext) -> Option<CapturedChange> {
        if mutation.entity_kind == self.audit_entity_kind {
            return None;
        }
        let operation = self.classify(mutation.state, &actor.method)?;

        let mut entry = ChangeEntry::new(mutation.handle, operation, &mutation.entity_kind, actor);

        for field in &mutation.fields {
            if field.is_pending {
                entry.pending_fields.push(PendingField {
                    name: field.name.clone(),
                    is_key: field.is_key,
                });
                continue;
            }

            if field.is_key {
                entry.key_values.insert(field.name.clone(), field.current.clone());
                continue;
            }

            match operation {
                OperationKind::Create => {
                    entry.new_values.insert(field.name.clone(), field.current.clone());
                }
                OperationKind::Delete => {
                    entry.old_values.insert(field.name.clone(), field.original.clone());
                }
                OperationKind::Update => {
                    if !field.is_modified {
                        continue;
                    }
                    if !ValueCodec::equal(&field.original, &field.current) {
                        entry.changed_fields.insert(field.name.clone());
                    }
                    entry.old_values.insert(field.name.clone(), field.original.clone());
                    entry.new_values.insert(field.name.clone(), field.current.clone());
                }
            }
        }

        Some(CapturedChange::classify(entry))
    }

    /// Capture every audited mutation of a tracker, in tracking order
    pub fn capture_all<T: ChangeTracker + ?Sized>(
        &self,
        tracker: &T,
        actor: &ActorContext,
    ) -> Vec<CapturedChange> {
        tracker
            .tracked_mutations()
            .iter()
            .filter_map(|mutation| self.capture(mutation, actor))
            .collect()
    }

    /// Capture and partition: ready entries are finalized immediately
    pub fn scan<T: ChangeTracker + ?Sized>(&self, tracker: &T, actor: &ActorContext) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();

        for change in self.capture_all(tracker, actor) {
            match change {
                CapturedChange::Ready(entry) => outcome.ready.push(entry.finalize()),
                CapturedChange::Deferred(deferred) => outcome.deferred.push(deferred),
            }
        }

        tracing::debug!(
            ready = outcome.ready.len(),
            deferred = outcome.deferred.len(),
            method = %actor.method,
            "scanned pending mutations"
        );

        outcome
    }
}
