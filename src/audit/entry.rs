//! Audit entry data structures
//!
//! `ChangeEntry` is the audit record under construction for one tracked
//! mutation. Once every value it depends on is known it is finalized into an
//! immutable `AuditRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::diff::generate_diff;
use crate::models::{describe_key, ActorContext, AuditRecordId, EntryHandle};

/// Field name to value
pub type FieldValues = BTreeMap<String, Value>;

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Entity was created
    Create,
    /// Entity was updated
    Update,
    /// Entity was deleted, physically or through the soft-delete convention
    Delete,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationKind::Create => write!(f, "CREATE"),
            OperationKind::Update => write!(f, "UPDATE"),
            OperationKind::Delete => write!(f, "DELETE"),
        }
    }
}

/// A field whose final value is assigned by the store during the write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingField {
    /// Field name
    pub name: String,
    /// Whether the field belongs to the identity key
    pub is_key: bool,
}

/// One entity's pending mutation, as seen by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
    /// Handle used to read post-write values back from the store
    pub handle: EntryHandle,
    pub operation: OperationKind,
    pub entity_kind: String,
    pub key_values: FieldValues,
    pub old_values: FieldValues,
    pub new_values: FieldValues,
    /// Fields whose old and new canonical values differ (updates only)
    pub changed_fields: BTreeSet<String>,
    /// Store-generated fields, in field order
    pub pending_fields: Vec<PendingField>,
    pub actor_id: Option<String>,
    pub method: String,
}

impl ChangeEntry {
    /// Start an empty entry for a classified mutation
    pub fn new(
        handle: EntryHandle,
        operation: OperationKind,
        entity_kind: impl Into<String>,
        actor: &ActorContext,
    ) -> Self {
        Self {
            handle,
            operation,
            entity_kind: entity_kind.into(),
            key_values: FieldValues::new(),
            old_values: FieldValues::new(),
            new_values: FieldValues::new(),
            changed_fields: BTreeSet::new(),
            pending_fields: Vec::new(),
            actor_id: actor.actor_id.clone(),
            method: actor.method.clone(),
        }
    }

    /// Whether every value of the record is already known
    pub fn is_ready(&self) -> bool {
        self.pending_fields.is_empty()
    }

    /// Turn the entry into its immutable record
    pub(crate) fn finalize(self) -> AuditRecord {
        debug_assert!(self.is_ready(), "finalizing an entry with pending fields");

        AuditRecord {
            id: AuditRecordId::new(),
            timestamp: Utc::now(),
            entity_kind: self.entity_kind,
            operation: self.operation,
            key_values: self.key_values,
            old_values: self.old_values,
            new_values: self.new_values,
            changed_fields: self.changed_fields.into_iter().collect(),
            actor_id: self.actor_id,
            method: self.method,
        }
    }
}

/// An entry waiting on store-generated values
///
/// Only the reconciler can turn it into an `AuditRecord`.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredEntry(ChangeEntry);

impl DeferredEntry {
    /// The entry under construction
    pub fn entry(&self) -> &ChangeEntry {
        &self.0
    }

    /// Fields still waiting on the store
    pub fn pending_fields(&self) -> &[PendingField] {
        &self.0.pending_fields
    }

    pub(crate) fn into_inner(self) -> ChangeEntry {
        self.0
    }
}

/// Result of capturing one mutation
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedChange {
    /// All values known at scan time
    Ready(ChangeEntry),
    /// Needs reconciliation after the write
    Deferred(DeferredEntry),
}

impl CapturedChange {
    /// Tag an entry by whether it still has pending fields
    pub(crate) fn classify(entry: ChangeEntry) -> Self {
        if entry.is_ready() {
            CapturedChange::Ready(entry)
        } else {
            CapturedChange::Deferred(DeferredEntry(entry))
        }
    }

    /// The captured entry, whatever its state
    pub fn entry(&self) -> &ChangeEntry {
        match self {
            CapturedChange::Ready(entry) => entry,
            CapturedChange::Deferred(deferred) => deferred.entry(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, CapturedChange::Ready(_))
    }
}

/// A single, immutable audit record
///
/// Records one completed mutation: what changed, who changed it and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    id: AuditRecordId,
    timestamp: DateTime<Utc>,
    entity_kind: String,
    operation: OperationKind,
    key_values: FieldValues,
    old_values: FieldValues,
    new_values: FieldValues,
    changed_fields: Vec<String>,
    actor_id: Option<String>,
    method: String,
}

impl AuditRecord {
    pub fn id(&self) -> AuditRecordId {
        self.id
    }

    /// When the record was finalized (UTC)
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn entity_kind(&self) -> &str {
        &self.entity_kind
    }

    pub fn operation(&self) -> OperationKind {
        self.operation
    }

    pub fn key_values(&self) -> &FieldValues {
        &self.key_values
    }

    pub fn old_values(&self) -> &FieldValues {
        &self.old_values
    }

    pub fn new_values(&self) -> &FieldValues {
        &self.new_values
    }

    pub fn changed_fields(&self) -> &[String] {
        &self.changed_fields
    }

    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Key values rendered as `field=value` pairs
    pub fn key_display(&self) -> String {
        describe_key(&self.key_values)
    }

    /// Human-readable summary of the value changes
    pub fn diff_summary(&self) -> Option<String> {
        generate_diff(&self.old_values, &self.new_values)
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_kind,
            self.key_display()
        );

        if let Some(actor) = &self.actor_id {
            output.push_str(&format!(" by {}", actor));
        }
        output.push_str(&format!(" ({})", self.method));

        if let Some(diff) = self.diff_summary() {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}
