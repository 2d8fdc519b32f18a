//! Export module for auditrail
//!
//! Exports the audit log in three formats:
//! - JSON: machine-readable, with export metadata
//! - YAML: human-readable, same structure as JSON
//! - CSV: one row per record, value maps encoded as JSON cells

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::export_audit_csv;
pub use self::json::{export_audit_json, AuditExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::export_audit_yaml;

use crate::error::AuditrailError;

pub(crate) fn export_err(e: impl std::fmt::Display) -> AuditrailError {
    AuditrailError::Export(e.to_string())
}
