//! In-memory store and mutation builders shared by the audit tests

use serde_json::Value;
use std::collections::HashMap;

use super::entry::{AuditRecord, ChangeEntry, OperationKind};
use crate::error::{AuditrailError, AuditrailResult};
use crate::models::{ActorContext, EntryHandle};
use crate::storage::{AuditCommit, ChangeTracker, EntityState, Store, TrackedField, TrackedMutation};

pub(crate) fn mutation(
    handle: usize,
    kind: &str,
    state: EntityState,
    fields: Vec<TrackedField>,
) -> TrackedMutation {
    TrackedMutation {
        handle: EntryHandle(handle),
        entity_kind: kind.to_string(),
        state,
        fields,
    }
}

pub(crate) fn field(name: &str, original: Value, current: Value, is_modified: bool) -> TrackedField {
    TrackedField {
        name: name.to_string(),
        is_key: false,
        is_modified,
        is_pending: false,
        original,
        current,
    }
}

pub(crate) fn key(name: &str, value: Value) -> TrackedField {
    TrackedField {
        is_key: true,
        ..field(name, value.clone(), value, false)
    }
}

pub(crate) fn pending_key(name: &str) -> TrackedField {
    TrackedField {
        is_key: true,
        is_pending: true,
        ..field(name, Value::Null, Value::Null, false)
    }
}

pub(crate) fn pending(name: &str) -> TrackedField {
    TrackedField {
        is_pending: true,
        ..field(name, Value::Null, Value::Null, false)
    }
}

pub(crate) fn added(name: &str, value: Value) -> TrackedField {
    field(name, Value::Null, value, false)
}

pub(crate) fn modified(name: &str, original: Value, current: Value) -> TrackedField {
    field(name, original, current, true)
}

/// Finalized update record for `kind` with key `id`, `name` changed from `old` to `new`
pub(crate) fn update_record(kind: &str, id: i64, old: &str, new: &str) -> AuditRecord {
    let mut entry = ChangeEntry::new(
        EntryHandle(0),
        OperationKind::Update,
        kind,
        &ActorContext::new("user-1", "PUT"),
    );
    entry.key_values.insert("id".into(), Value::from(id));
    entry.old_values.insert("name".into(), Value::from(old));
    entry.new_values.insert("name".into(), Value::from(new));
    entry.changed_fields.insert("name".into());
    entry.finalize()
}

/// Store double: fixed mutations, values generated on commit, switchable failures
#[derive(Default)]
pub(crate) struct FakeStore {
    pub mutations: Vec<TrackedMutation>,
    pub generated: HashMap<(usize, String), Value>,
    pub committed: bool,
    pub fail_commit: bool,
    pub fail_audit: bool,
    pub commits: usize,
    pub audit_commits: usize,
    pub audit_records: Vec<AuditRecord>,
}

impl FakeStore {
    pub fn new(mutations: Vec<TrackedMutation>) -> Self {
        Self {
            mutations,
            ..Self::default()
        }
    }

    /// Value the store assigns to `field` of `handle` when committing
    pub fn generates(mut self, handle: usize, field: &str, value: Value) -> Self {
        self.generated.insert((handle, field.to_string()), value);
        self
    }
}

impl ChangeTracker for FakeStore {
    fn tracked_mutations(&self) -> Vec<TrackedMutation> {
        self.mutations.clone()
    }

    fn resolved_value(&self, handle: EntryHandle, field: &str) -> Option<Value> {
        if self.committed {
            if let Some(value) = self.generated.get(&(handle.index(), field.to_string())) {
                return Some(value.clone());
            }
        }

        let mutation = self.mutations.iter().find(|m| m.handle == handle)?;
        let tracked = mutation.fields.iter().find(|f| f.name == field)?;
        if tracked.is_pending {
            None
        } else {
            Some(tracked.current.clone())
        }
    }
}

impl Store for FakeStore {
    fn commit(&mut self) -> AuditrailResult<usize> {
        self.commits += 1;
        if self.fail_commit {
            return Err(AuditrailError::Storage("disk full".into()));
        }
        self.committed = true;
        Ok(self
            .mutations
            .iter()
            .filter(|m| !matches!(m.state, EntityState::Unchanged | EntityState::Detached))
            .count())
    }
}

impl AuditCommit for FakeStore {
    fn commit_audit(&mut self, records: &[AuditRecord]) -> AuditrailResult<()> {
        self.audit_commits += 1;
        if self.fail_audit {
            return Err(AuditrailError::Io("audit table unavailable".into()));
        }
        self.audit_records.extend_from_slice(records);
        Ok(())
    }
}
