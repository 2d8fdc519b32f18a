//! Entity schema model
//!
//! Describes the entity kinds a store can hold: their fields, which fields
//! form the identity key, and which values the store generates at write time.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::AuditrailError;

/// One stored entity instance, field name to value
pub type Row = Map<String, Value>;

/// Identity key of one entity instance, key field name to value
pub type KeyValues = BTreeMap<String, Value>;

/// How the store fills a field it generates during the write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Generated {
    /// Auto-incrementing integer taken from a per-kind sequence
    Identity,
    /// RFC 3339 timestamp of the write
    Timestamp,
}

impl fmt::Display for Generated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Generated::Identity => write!(f, "identity"),
            Generated::Timestamp => write!(f, "timestamp"),
        }
    }
}

/// A single field of an entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Field name
    pub name: String,

    /// Whether the field is part of the identity key
    #[serde(default)]
    pub key: bool,

    /// Set when the store assigns this value at write time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<Generated>,

    /// Whether a non-null value must be present when written
    #[serde(default)]
    pub required: bool,
}

impl FieldSchema {
    /// Create a plain, optional field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: false,
            generated: None,
            required: false,
        }
    }

    /// Mark the field as part of the identity key
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    /// Mark the field as store-generated
    pub fn generated(mut self, generated: Generated) -> Self {
        self.generated = Some(generated);
        self
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Schema of one entity kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Logical type name (e.g. "Product")
    pub kind: String,

    /// Fields in declaration order
    pub fields: Vec<FieldSchema>,

    /// Boolean field set to `true` by a soft delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_delete_field: Option<String>,
}

impl EntitySchema {
    /// Create a schema from its fields
    pub fn new(kind: impl Into<String>, fields: Vec<FieldSchema>) -> Self {
        Self {
            kind: kind.into(),
            fields,
            soft_delete_field: None,
        }
    }

    /// Name the flag field used for soft deletes
    pub fn with_soft_delete(mut self, field: impl Into<String>) -> Self {
        self.soft_delete_field = Some(field.into());
        self
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Iterate over the identity key fields
    pub fn key_fields(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter().filter(|f| f.key)
    }

    /// Extract the identity key of a row
    ///
    /// Missing key fields are reported as `Value::Null`.
    pub fn key_of(&self, row: &Row) -> KeyValues {
        self.key_fields()
            .map(|f| (f.name.clone(), row.get(&f.name).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Validate the schema definition
    pub fn validate(&self) -> Result<(), AuditrailError> {
        if self.kind.trim().is_empty() {
            return Err(AuditrailError::Validation(
                "Entity kind cannot be empty".into(),
            ));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(AuditrailError::Validation(format!(
                    "{} has a field with an empty name",
                    self.kind
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(AuditrailError::Validation(format!(
                    "{} declares field '{}' twice",
                    self.kind, field.name
                )));
            }
            if field.key && field.generated == Some(Generated::Timestamp) {
                return Err(AuditrailError::Validation(format!(
                    "{}.{}: timestamp fields cannot be keys",
                    self.kind, field.name
                )));
            }
        }

        if self.key_fields().next().is_none() {
            return Err(AuditrailError::Validation(format!(
                "{} has no key field",
                self.kind
            )));
        }

        if let Some(flag) = &self.soft_delete_field {
            match self.field(flag) {
                Some(f) if !f.key && f.generated.is_none() => {}
                _ => {
                    return Err(AuditrailError::Validation(format!(
                        "{}: soft delete field '{}' must be a plain field",
                        self.kind, flag
                    )))
                }
            }
        }

        Ok(())
    }

    /// The schemas registered on a fresh installation
    pub fn defaults() -> Vec<EntitySchema> {
        vec![
            EntitySchema::new(
                "Category",
                vec![
                    FieldSchema::new("id").key().generated(Generated::Identity),
                    FieldSchema::new("name").required(),
                    FieldSchema::new("created_at").generated(Generated::Timestamp),
                ],
            ),
            EntitySchema::new(
                "Product",
                vec![
                    FieldSchema::new("id").key().generated(Generated::Identity),
                    FieldSchema::new("name").required(),
                    FieldSchema::new("price"),
                    FieldSchema::new("is_deleted"),
                    FieldSchema::new("created_at").generated(Generated::Timestamp),
                ],
            )
            .with_soft_delete("is_deleted"),
            EntitySchema::new(
                "User",
                vec![
                    FieldSchema::new("id").key().generated(Generated::Identity),
                    FieldSchema::new("user_name").required(),
                    FieldSchema::new("email"),
                    FieldSchema::new("created_at").generated(Generated::Timestamp),
                ],
            ),
            EntitySchema::new(
                "Invoice",
                vec![
                    FieldSchema::new("id").key().generated(Generated::Identity),
                    FieldSchema::new("user_id").required(),
                    FieldSchema::new("total"),
                    FieldSchema::new("created_at").generated(Generated::Timestamp),
                ],
            ),
            EntitySchema::new(
                "ProductInCategory",
                vec![
                    FieldSchema::new("product_id").key(),
                    FieldSchema::new("category_id").key(),
                ],
            ),
        ]
    }
}

/// Render key values as `field=value` pairs for messages
pub fn describe_key(key: &KeyValues) -> String {
    key.iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_schemas_are_valid() {
        for schema in EntitySchema::defaults() {
            schema.validate().unwrap();
        }
    }

    #[test]
    fn test_key_of_composite_key() {
        let schema = EntitySchema::defaults()
            .into_iter()
            .find(|s| s.kind == "ProductInCategory")
            .unwrap();

        let row: Row = json!({"product_id": 1, "category_id": 2})
            .as_object()
            .unwrap()
            .clone();

        let key = schema.key_of(&row);
        assert_eq!(key.len(), 2);
        assert_eq!(describe_key(&key), "category_id=2,product_id=1");
    }

    #[test]
    fn test_schema_without_key_rejected() {
        let schema = EntitySchema::new("Note", vec![FieldSchema::new("text")]);
        assert!(schema.validate().unwrap_err().is_validation());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = EntitySchema::new(
            "Note",
            vec![FieldSchema::new("id").key(), FieldSchema::new("id")],
        );
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_soft_delete_field_must_exist() {
        let schema = EntitySchema::new("Note", vec![FieldSchema::new("id").key()])
            .with_soft_delete("archived");
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_serialization_skips_absent_generation() {
        let field = FieldSchema::new("name").required();
        let json = serde_json::to_string(&field).unwrap();
        assert!(!json.contains("generated"));

        let parsed: FieldSchema = serde_json::from_str(r#"{"name":"id","key":true,"generated":"identity"}"#).unwrap();
        assert_eq!(parsed.generated, Some(Generated::Identity));
        assert!(!parsed.required);
    }
}
