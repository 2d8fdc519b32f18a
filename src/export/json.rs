//! JSON export of the audit log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use super::export_err;
use crate::audit::AuditRecord;
use crate::error::AuditrailResult;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Audit log export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    pub metadata: ExportMetadata,

    /// Exported records, oldest first
    pub records: Vec<AuditRecord>,
}

/// Summary of the exported records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub record_count: usize,

    /// Record count per entity kind
    pub kinds: BTreeMap<String, usize>,

    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl AuditExport {
    pub fn new(records: Vec<AuditRecord>) -> Self {
        let mut kinds = BTreeMap::new();
        for record in &records {
            *kinds.entry(record.entity_kind().to_string()).or_insert(0) += 1;
        }

        let metadata = ExportMetadata {
            record_count: records.len(),
            kinds,
            earliest: records.iter().map(|r| r.timestamp()).min(),
            latest: records.iter().map(|r| r.timestamp()).max(),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            metadata,
            records,
        }
    }
}

/// Export audit records as pretty-printed JSON
pub fn export_audit_json<W: Write>(records: &[AuditRecord], writer: &mut W) -> AuditrailResult<()> {
    let export = AuditExport::new(records.to_vec());
    serde_json::to_writer_pretty(&mut *writer, &export).map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::update_record;

    #[test]
    fn test_json_export() {
        let records = vec![
            update_record("Product", 7, "x", "y"),
            update_record("Product", 8, "a", "b"),
            update_record("User", 1, "ana", "anna"),
        ];

        let mut output = Vec::new();
        export_audit_json(&records, &mut output).unwrap();

        let parsed: AuditExport = serde_json::from_slice(&output).unwrap();
        assert_eq!(parsed.schema_version, EXPORT_SCHEMA_VERSION);
        assert_eq!(parsed.metadata.record_count, 3);
        assert_eq!(parsed.metadata.kinds["Product"], 2);
        assert_eq!(parsed.records, records);
    }

    #[test]
    fn test_empty_export() {
        let mut output = Vec::new();
        export_audit_json(&[], &mut output).unwrap();

        let parsed: AuditExport = serde_json::from_slice(&output).unwrap();
        assert!(parsed.records.is_empty());
        assert!(parsed.metadata.earliest.is_none());
    }
}
