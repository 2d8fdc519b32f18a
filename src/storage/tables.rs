//! Entity table repository
//!
//! All entity rows live in one JSON document (`data/tables.json`) together
//! with the identity sequences. Writes are applied to a copy of the tables,
//! saved atomically, and only then swapped into memory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{AuditrailError, AuditrailResult};
use crate::models::{describe_key, EntitySchema, KeyValues, Row};

use super::file_io::{read_json, write_json_atomic};

/// Serializable table data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TableData {
    /// Last identity value handed out, per entity kind
    #[serde(default)]
    pub sequences: BTreeMap<String, i64>,

    /// Rows per entity kind, in insertion order
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Row>>,
}

impl TableData {
    fn position(&self, kind: &str, schema: &EntitySchema, key: &KeyValues) -> Option<usize> {
        self.tables
            .get(kind)?
            .iter()
            .position(|row| &schema.key_of(row) == key)
    }

    /// Find a row by its identity key
    pub fn find(&self, schema: &EntitySchema, key: &KeyValues) -> Option<&Row> {
        let index = self.position(&schema.kind, schema, key)?;
        self.tables.get(&schema.kind).map(|rows| &rows[index])
    }

    /// Next identity value for a kind
    pub fn next_sequence(&mut self, kind: &str) -> i64 {
        let seq = self.sequences.entry(kind.to_string()).or_insert(0);
        *seq += 1;
        *seq
    }

    /// Make sure future identity values stay above an explicit one
    pub fn observe_identity(&mut self, kind: &str, value: &Value) {
        if let Some(explicit) = value.as_i64() {
            let seq = self.sequences.entry(kind.to_string()).or_insert(0);
            if explicit > *seq {
                *seq = explicit;
            }
        }
    }

    /// Insert a new row, rejecting duplicate keys
    pub fn insert(&mut self, schema: &EntitySchema, row: Row) -> AuditrailResult<()> {
        let key = schema.key_of(&row);
        if self.position(&schema.kind, schema, &key).is_some() {
            return Err(AuditrailError::Duplicate {
                entity_kind: schema.kind.clone(),
                identifier: describe_key(&key),
            });
        }
        self.tables.entry(schema.kind.clone()).or_default().push(row);
        Ok(())
    }

    /// Replace the row stored under `key`
    pub fn replace(&mut self, schema: &EntitySchema, key: &KeyValues, row: Row) -> AuditrailResult<()> {
        let index = self
            .position(&schema.kind, schema, key)
            .ok_or_else(|| AuditrailError::not_found(&schema.kind, describe_key(key)))?;
        if let Some(rows) = self.tables.get_mut(&schema.kind) {
            rows[index] = row;
        }
        Ok(())
    }

    /// Remove the row stored under `key`
    pub fn remove(&mut self, schema: &EntitySchema, key: &KeyValues) -> AuditrailResult<Row> {
        let index = self
            .position(&schema.kind, schema, key)
            .ok_or_else(|| AuditrailError::not_found(&schema.kind, describe_key(key)))?;
        let rows = self
            .tables
            .get_mut(&schema.kind)
            .ok_or_else(|| AuditrailError::not_found(&schema.kind, describe_key(key)))?;
        Ok(rows.remove(index))
    }
}

/// Repository for entity rows
pub struct TableRepository {
    path: PathBuf,
    data: RwLock<TableData>,
}

impl TableRepository {
    /// Create a new table repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(TableData::default()),
        }
    }

    /// Load tables from disk
    pub fn load(&self) -> AuditrailResult<()> {
        let file_data: TableData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            AuditrailError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = file_data;

        Ok(())
    }

    /// Get a row by its identity key
    pub fn get(&self, schema: &EntitySchema, key: &KeyValues) -> AuditrailResult<Option<Row>> {
        let data = self.data.read().map_err(|e| {
            AuditrailError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.find(schema, key).cloned())
    }

    /// Get all rows of a kind, in insertion order
    pub fn get_all(&self, kind: &str) -> AuditrailResult<Vec<Row>> {
        let data = self.data.read().map_err(|e| {
            AuditrailError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.tables.get(kind).cloned().unwrap_or_default())
    }

    /// Count rows of a kind
    pub fn count(&self, kind: &str) -> AuditrailResult<usize> {
        let data = self.data.read().map_err(|e| {
            AuditrailError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.tables.get(kind).map_or(0, Vec::len))
    }

    /// Apply a batch of writes atomically
    ///
    /// `f` works on a copy of the tables. The copy is saved to disk and
    /// replaces the in-memory tables only if `f` and the save both succeed.
    pub(crate) fn apply<T>(
        &self,
        f: impl FnOnce(&mut TableData) -> AuditrailResult<T>,
    ) -> AuditrailResult<T> {
        let mut data = self.data.write().map_err(|e| {
            AuditrailError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let mut staged = data.clone();
        let result = f(&mut staged)?;
        write_json_atomic(&self.path, &staged)?;
        *data = staged;

        Ok(result)
    }
}
