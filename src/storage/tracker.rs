//! Collaborator contracts between the audit pipeline and a store
//!
//! The pipeline never reaches into a concrete store. It reads pending
//! mutations through `ChangeTracker`, writes through `Store::commit`, and
//! persists audit records through the narrower `AuditCommit` capability.

use serde_json::Value;
use std::fmt;

use crate::audit::AuditRecord;
use crate::error::AuditrailResult;
use crate::models::EntryHandle;

/// Lifecycle state of a tracked entity instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    /// New instance, inserted on commit
    Added,
    /// Loaded instance with at least one field set
    Modified,
    /// Loaded instance removed on commit
    Deleted,
    /// Loaded instance with no pending change
    Unchanged,
    /// No longer tracked
    Detached,
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityState::Added => write!(f, "Added"),
            EntityState::Modified => write!(f, "Modified"),
            EntityState::Deleted => write!(f, "Deleted"),
            EntityState::Unchanged => write!(f, "Unchanged"),
            EntityState::Detached => write!(f, "Detached"),
        }
    }
}

/// Snapshot of one field of a tracked entity
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedField {
    pub name: String,
    /// Part of the identity key
    pub is_key: bool,
    /// Set since the entity was loaded
    pub is_modified: bool,
    /// Value will be generated by the store during the write
    pub is_pending: bool,
    /// Value when the entity was loaded (`Null` for added entities)
    pub original: Value,
    pub current: Value,
}

/// Snapshot of one tracked entity and its lifecycle state
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMutation {
    pub handle: EntryHandle,
    pub entity_kind: String,
    pub state: EntityState,
    pub fields: Vec<TrackedField>,
}

/// Read-only view of a unit of work's pending changes
pub trait ChangeTracker {
    /// Snapshot every tracked entity, in tracking order
    fn tracked_mutations(&self) -> Vec<TrackedMutation>;

    /// Read a field value after a confirmed write
    ///
    /// Returns `None` if the handle is unknown or the value is still not
    /// resolved.
    fn resolved_value(&self, handle: EntryHandle, field: &str) -> Option<Value>;
}

/// A store that can apply a unit of work
///
/// `commit` is the plain write. Auditing callers go through
/// `AuditPipeline::commit` instead.
pub trait Store: ChangeTracker {
    /// Apply all pending mutations, returning the number of affected rows
    ///
    /// On success every store-generated value becomes readable through
    /// `ChangeTracker::resolved_value`.
    fn commit(&mut self) -> AuditrailResult<usize>;
}

/// Write access restricted to the audit record collection
pub trait AuditCommit {
    /// Append audit records and commit them, touching nothing else
    fn commit_audit(&mut self, records: &[AuditRecord]) -> AuditrailResult<()>;
}
