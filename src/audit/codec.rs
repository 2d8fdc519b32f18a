//! Value canonicalization for change detection
//!
//! Field values are compared through a structural serialization rather than
//! by identity, so two independently built composite values with the same
//! contents compare equal. Object keys are sorted before serialization.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use crate::error::AuditrailResult;

/// Comparable, serialization-based form of a field value
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalForm(String);

impl CanonicalForm {
    /// The canonical serialization
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalizes field values for equality and diff purposes
pub struct ValueCodec;

impl ValueCodec {
    /// Canonicalize a JSON value
    ///
    /// `null` canonicalizes to `null` and never collides with a present
    /// value such as `0`, `false`, `""` or `"null"`.
    pub fn canonicalize(value: &Value) -> CanonicalForm {
        CanonicalForm(sorted(value).to_string())
    }

    /// Canonicalize any serializable value
    pub fn canonicalize_serialize<T: Serialize>(value: &T) -> AuditrailResult<CanonicalForm> {
        let value = serde_json::to_value(value)?;
        Ok(Self::canonicalize(&value))
    }

    /// Structural equality of two values
    pub fn equal(a: &Value, b: &Value) -> bool {
        Self::canonicalize(a) == Self::canonicalize(b)
    }
}

// Rebuilds objects with their keys inserted in sorted order so the output
// does not depend on serde_json's map ordering feature.
fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), sorted(&obj[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
