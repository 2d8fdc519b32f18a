//! Custom error types for auditrail
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

/// The main error type for auditrail operations
#[derive(Error, Debug)]
pub enum AuditrailError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for entity values and schemas
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_kind} not found: {identifier}")]
    NotFound {
        entity_kind: String,
        identifier: String,
    },

    /// Duplicate entity errors
    #[error("{entity_kind} already exists: {identifier}")]
    Duplicate {
        entity_kind: String,
        identifier: String,
    },

    /// A pending write violates a schema constraint
    #[error("Constraint violation on {entity_kind}.{field}: {reason}")]
    Constraint {
        entity_kind: String,
        field: String,
        reason: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// A store-generated value was still unknown after a confirmed write.
    ///
    /// The primary write has already been applied when this is returned.
    #[error("Store did not resolve generated field {entity_kind}.{field} after commit")]
    ReconciliationInvariant { entity_kind: String, field: String },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),
}

impl AuditrailError {
    /// Create a "not found" error for an entity kind
    pub fn not_found(entity_kind: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_kind: entity_kind.into(),
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for an unregistered entity kind
    pub fn unknown_kind(entity_kind: impl Into<String>) -> Self {
        Self::NotFound {
            entity_kind: "Entity kind".into(),
            identifier: entity_kind.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint(
        entity_kind: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Constraint {
            entity_kind: entity_kind.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error signals a broken store contract
    pub fn is_reconciliation_invariant(&self) -> bool {
        matches!(self, Self::ReconciliationInvariant { .. })
    }
}

impl From<std::io::Error> for AuditrailError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AuditrailError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for auditrail operations
pub type AuditrailResult<T> = Result<T, AuditrailError>;
