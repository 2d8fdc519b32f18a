//! Database handle and unit of work
//!
//! A `UnitOfWork` tracks entity instances and their pending changes in
//! memory. Nothing reaches disk until `Store::commit`, which validates the
//! batch, fills store-generated values and writes all tables in one atomic
//! save.

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeSet;

use crate::audit::{AuditLogger, AuditPipeline, AuditRecord};
use crate::config::{AuditrailPaths, Settings};
use crate::error::{AuditrailError, AuditrailResult};
use crate::models::{describe_key, EntitySchema, EntryHandle, Generated, KeyValues, Row};

use super::tables::TableRepository;
use super::tracker::{AuditCommit, ChangeTracker, EntityState, Store, TrackedField, TrackedMutation};

/// Entity tables, schema registry and audit log of one installation
pub struct Database {
    paths: AuditrailPaths,
    settings: Settings,
    tables: TableRepository,
    audit_log: AuditLogger,
}

impl Database {
    /// Open the database described by `paths` and `settings`
    pub fn open(paths: AuditrailPaths, settings: Settings) -> AuditrailResult<Self> {
        paths.ensure_directories()?;
        settings.validate()?;

        let tables = TableRepository::new(paths.tables_file());
        tables.load()?;

        Ok(Self {
            audit_log: AuditLogger::new(paths.audit_log()),
            tables,
            settings,
            paths,
        })
    }

    /// Start a new unit of work
    pub fn begin(&self) -> UnitOfWork<'_> {
        UnitOfWork {
            db: self,
            entries: Vec::new(),
        }
    }

    /// The audited commit configured for this database
    pub fn pipeline(&self) -> AuditPipeline {
        AuditPipeline::from_settings(&self.settings, &self.paths)
    }

    /// Look up a registered entity schema
    pub fn schema(&self, kind: &str) -> AuditrailResult<&EntitySchema> {
        self.settings
            .schema(kind)
            .ok_or_else(|| AuditrailError::unknown_kind(kind))
    }

    /// All stored rows of a kind
    pub fn rows(&self, kind: &str) -> AuditrailResult<Vec<Row>> {
        self.schema(kind)?;
        self.tables.get_all(kind)
    }

    /// Number of stored rows of a kind
    pub fn count(&self, kind: &str) -> AuditrailResult<usize> {
        self.schema(kind)?;
        self.tables.count(kind)
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit_log
    }

    /// Outbox holding records whose audit write failed
    pub fn audit_outbox(&self) -> AuditLogger {
        AuditLogger::new(self.paths.audit_outbox())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn paths(&self) -> &AuditrailPaths {
        &self.paths
    }
}

struct TrackedEntry<'a> {
    schema: &'a EntitySchema,
    state: EntityState,
    /// Values as loaded; empty for added entities
    original: Row,
    current: Row,
    modified: BTreeSet<String>,
}

impl TrackedEntry<'_> {
    fn value(row: &Row, field: &str) -> Value {
        row.get(field).cloned().unwrap_or(Value::Null)
    }

    fn is_unresolved(&self, field: &str) -> bool {
        self.schema
            .field(field)
            .map_or(false, |f| f.generated.is_some())
            && Self::value(&self.current, field).is_null()
    }
}

/// In-memory change tracker over a `Database`
///
/// One unit of work should have at most one commit in flight.
pub struct UnitOfWork<'a> {
    db: &'a Database,
    entries: Vec<TrackedEntry<'a>>,
}

impl<'a> UnitOfWork<'a> {
    /// Track a new entity instance
    ///
    /// Store-generated fields left out of `values` are filled on commit.
    pub fn add(&mut self, kind: &str, values: Row) -> AuditrailResult<EntryHandle> {
        let db = self.db;
        let schema = db.schema(kind)?;

        if let Some(unknown) = values.keys().find(|name| schema.field(name).is_none()) {
            return Err(AuditrailError::Validation(format!(
                "{} has no field '{}'",
                kind, unknown
            )));
        }

        let current: Row = schema
            .fields
            .iter()
            .map(|f| (f.name.clone(), TrackedEntry::value(&values, &f.name)))
            .collect();

        Ok(self.track(TrackedEntry {
            schema,
            state: EntityState::Added,
            original: Row::new(),
            current,
            modified: BTreeSet::new(),
        }))
    }

    /// Load a stored entity by key and start tracking it as unchanged
    ///
    /// Returns the existing handle if the entity is already tracked.
    pub fn find(&mut self, kind: &str, key: &KeyValues) -> AuditrailResult<Option<EntryHandle>> {
        let db = self.db;
        let schema = db.schema(kind)?;

        if let Some(index) = self.entries.iter().position(|e| {
            e.schema.kind == kind
                && e.state != EntityState::Detached
                && e.state != EntityState::Added
                && &schema.key_of(&e.original) == key
        }) {
            return Ok(Some(EntryHandle(index)));
        }

        let Some(row) = db.tables.get(schema, key)? else {
            return Ok(None);
        };

        Ok(Some(self.track(TrackedEntry {
            schema,
            state: EntityState::Unchanged,
            original: row.clone(),
            current: row,
            modified: BTreeSet::new(),
        })))
    }

    /// Set a field of a tracked entity
    pub fn set(&mut self, handle: EntryHandle, field: &str, value: Value) -> AuditrailResult<()> {
        let entry = self.entry_mut(handle)?;
        let schema = entry.schema;
        let kind = &schema.kind;

        let schema_field = schema.field(field).ok_or_else(|| {
            AuditrailError::Validation(format!("{} has no field '{}'", kind, field))
        })?;

        match entry.state {
            EntityState::Deleted | EntityState::Detached => {
                return Err(AuditrailError::Validation(format!(
                    "{} {} is {} and cannot be changed",
                    kind, handle, entry.state
                )));
            }
            EntityState::Unchanged | EntityState::Modified if schema_field.key => {
                return Err(AuditrailError::Validation(format!(
                    "{}.{} is part of the key and cannot be changed",
                    kind, field
                )));
            }
            _ => {}
        }

        entry.current.insert(field.to_string(), value);
        match entry.state {
            EntityState::Unchanged | EntityState::Modified => {
                entry.state = EntityState::Modified;
                entry.modified.insert(field.to_string());
            }
            _ => {}
        }

        Ok(())
    }

    /// Mark a tracked entity for deletion
    ///
    /// An entity added in this unit of work is simply no longer tracked.
    pub fn remove(&mut self, handle: EntryHandle) -> AuditrailResult<()> {
        let entry = self.entry_mut(handle)?;
        entry.state = match entry.state {
            EntityState::Added => EntityState::Detached,
            EntityState::Unchanged | EntityState::Modified | EntityState::Deleted => {
                EntityState::Deleted
            }
            EntityState::Detached => {
                return Err(AuditrailError::Validation(format!(
                    "{} {} is not tracked",
                    entry.schema.kind, handle
                )))
            }
        };
        Ok(())
    }

    /// Soft-delete a tracked entity by setting its schema's flag field
    pub fn soft_delete(&mut self, handle: EntryHandle) -> AuditrailResult<()> {
        let entry = self.entry_mut(handle)?;
        let flag = entry.schema.soft_delete_field.clone().ok_or_else(|| {
            AuditrailError::Validation(format!(
                "{} does not support soft deletes",
                entry.schema.kind
            ))
        })?;
        self.set(handle, &flag, Value::Bool(true))
    }

    /// Stop tracking an entity; its pending change is dropped
    pub fn detach(&mut self, handle: EntryHandle) -> AuditrailResult<()> {
        self.entry_mut(handle)?.state = EntityState::Detached;
        Ok(())
    }

    /// Current values of a tracked entity
    pub fn get(&self, handle: EntryHandle) -> Option<&Row> {
        self.entries.get(handle.0).map(|e| &e.current)
    }

    /// Lifecycle state of a tracked entity
    pub fn state(&self, handle: EntryHandle) -> Option<EntityState> {
        self.entries.get(handle.0).map(|e| e.state)
    }

    /// Whether any tracked entity has a pending write
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|e| {
            matches!(
                e.state,
                EntityState::Added | EntityState::Modified | EntityState::Deleted
            )
        })
    }

    fn track(&mut self, entry: TrackedEntry<'a>) -> EntryHandle {
        self.entries.push(entry);
        EntryHandle(self.entries.len() - 1)
    }

    fn entry_mut(&mut self, handle: EntryHandle) -> AuditrailResult<&mut TrackedEntry<'a>> {
        self.entries
            .get_mut(handle.0)
            .ok_or_else(|| AuditrailError::not_found("Tracked entity", handle.to_string()))
    }

    fn validate_pending(&self) -> AuditrailResult<()> {
        for entry in &self.entries {
            if !matches!(entry.state, EntityState::Added | EntityState::Modified) {
                continue;
            }
            for field in &entry.schema.fields {
                if field.generated.is_some() {
                    continue;
                }
                if (field.required || field.key)
                    && TrackedEntry::value(&entry.current, &field.name).is_null()
                {
                    return Err(AuditrailError::constraint(
                        &entry.schema.kind,
                        &field.name,
                        "value is required",
                    ));
                }
            }
        }
        Ok(())
    }
}

impl ChangeTracker for UnitOfWork<'_> {
    fn tracked_mutations(&self) -> Vec<TrackedMutation> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| TrackedMutation {
                handle: EntryHandle(index),
                entity_kind: entry.schema.kind.clone(),
                state: entry.state,
                fields: entry
                    .schema
                    .fields
                    .iter()
                    .map(|f| TrackedField {
                        name: f.name.clone(),
                        is_key: f.key,
                        is_modified: entry.modified.contains(&f.name),
                        is_pending: entry.state == EntityState::Added
                            && entry.is_unresolved(&f.name),
                        original: TrackedEntry::value(&entry.original, &f.name),
                        current: TrackedEntry::value(&entry.current, &f.name),
                    })
                    .collect(),
            })
            .collect()
    }

    fn resolved_value(&self, handle: EntryHandle, field: &str) -> Option<Value> {
        let entry = self.entries.get(handle.0)?;
        entry.schema.field(field)?;
        if entry.is_unresolved(field) {
            return None;
        }
        Some(TrackedEntry::value(&entry.current, field))
    }
}

impl Store for UnitOfWork<'_> {
    fn commit(&mut self) -> AuditrailResult<usize> {
        self.validate_pending()?;

        let entries = &self.entries;
        let written = self.db.tables.apply(|data| {
            let mut written: Vec<(usize, Row)> = Vec::new();

            for (index, entry) in entries.iter().enumerate() {
                let schema = entry.schema;
                match entry.state {
                    EntityState::Added => {
                        let mut row = entry.current.clone();
                        for field in &schema.fields {
                            let Some(generated) = field.generated else {
                                continue;
                            };
                            let value = TrackedEntry::value(&row, &field.name);
                            if !value.is_null() {
                                if generated == Generated::Identity {
                                    data.observe_identity(&schema.kind, &value);
                                }
                                continue;
                            }
                            let assigned = match generated {
                                Generated::Identity => Value::from(data.next_sequence(&schema.kind)),
                                Generated::Timestamp => Value::String(Utc::now().to_rfc3339()),
                            };
                            row.insert(field.name.clone(), assigned);
                        }
                        data.insert(schema, row.clone())?;
                        written.push((index, row));
                    }
                    EntityState::Modified => {
                        let key = schema.key_of(&entry.original);
                        data.replace(schema, &key, entry.current.clone())?;
                        written.push((index, entry.current.clone()));
                    }
                    EntityState::Deleted => {
                        let key = schema.key_of(&entry.original);
                        data.remove(schema, &key)?;
                        written.push((index, Row::new()));
                    }
                    EntityState::Unchanged | EntityState::Detached => {}
                }
            }

            Ok(written)
        })?;

        let rows_affected = written.len();
        for (index, row) in written {
            let entry = &mut self.entries[index];
            if entry.state == EntityState::Deleted {
                entry.state = EntityState::Detached;
            } else {
                entry.original = row.clone();
                entry.current = row;
                entry.modified.clear();
                entry.state = EntityState::Unchanged;
            }
        }

        tracing::debug!(rows_affected, "committed unit of work");
        Ok(rows_affected)
    }
}

impl AuditCommit for UnitOfWork<'_> {
    fn commit_audit(&mut self, records: &[AuditRecord]) -> AuditrailResult<()> {
        self.db.audit_log.log_batch(records)
    }
}

/// Parse a key given as `value` or `field=value,field=value`
///
/// Values are read as JSON when possible, otherwise as strings.
pub fn parse_key(schema: &EntitySchema, input: &str) -> AuditrailResult<KeyValues> {
    let key_fields: Vec<_> = schema.key_fields().collect();
    let mut key = KeyValues::new();

    if !input.contains('=') {
        if key_fields.len() != 1 {
            return Err(AuditrailError::Validation(format!(
                "{} has a composite key; use field=value pairs",
                schema.kind
            )));
        }
        key.insert(key_fields[0].name.clone(), parse_value(input));
        return Ok(key);
    }

    for pair in input.split(',') {
        let (name, value) = pair.split_once('=').ok_or_else(|| {
            AuditrailError::Validation(format!("Invalid key component: '{}'", pair))
        })?;
        let name = name.trim();
        if !key_fields.iter().any(|f| f.name == name) {
            return Err(AuditrailError::Validation(format!(
                "'{}' is not a key field of {}",
                name, schema.kind
            )));
        }
        key.insert(name.to_string(), parse_value(value.trim()));
    }

    if key.len() != key_fields.len() {
        return Err(AuditrailError::Validation(format!(
            "Incomplete key for {}: {}",
            schema.kind,
            describe_key(&key)
        )));
    }

    Ok(key)
}

/// Parse a command-line value as JSON, falling back to a plain string
pub fn parse_value(input: &str) -> Value {
    serde_json::from_str(input).unwrap_or_else(|_| Value::String(input.to_string()))
}
