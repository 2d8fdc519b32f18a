//! CSV export of the audit log
//!
//! Key, old and new values are written as JSON objects so that every value
//! type survives the round trip through a spreadsheet.

use std::io::Write;

use super::export_err;
use crate::audit::{AuditRecord, FieldValues};
use crate::error::AuditrailResult;

const HEADER: [&str; 10] = [
    "id",
    "timestamp",
    "entity_kind",
    "operation",
    "key_values",
    "old_values",
    "new_values",
    "changed_fields",
    "actor_id",
    "method",
];

fn json_cell(values: &FieldValues) -> AuditrailResult<String> {
    serde_json::to_string(values).map_err(export_err)
}

/// Export audit records as CSV, one row per record
pub fn export_audit_csv<W: Write>(records: &[AuditRecord], writer: &mut W) -> AuditrailResult<()> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);
    csv_writer.write_record(HEADER).map_err(export_err)?;

    for record in records {
        csv_writer
            .write_record([
                record.id().as_uuid().to_string(),
                record.timestamp().to_rfc3339(),
                record.entity_kind().to_string(),
                record.operation().to_string(),
                json_cell(record.key_values())?,
                json_cell(record.old_values())?,
                json_cell(record.new_values())?,
                record.changed_fields().join(";"),
                record.actor_id().unwrap_or_default().to_string(),
                record.method().to_string(),
            ])
            .map_err(export_err)?;
    }

    csv_writer.flush().map_err(export_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::update_record;

    #[test]
    fn test_csv_export() {
        let records = vec![
            update_record("Product", 7, "x", "y"),
            update_record("Product", 8, "Lamp, large", "Lamp"),
        ];

        let mut output = Vec::new();
        export_audit_csv(&records, &mut output).unwrap();

        let mut reader = ::csv::Reader::from_reader(output.as_slice());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), HEADER.len());

        let rows: Vec<_> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "UPDATE");
        assert_eq!(&rows[0][4], r#"{"id":7}"#);
        assert_eq!(&rows[1][5], r#"{"name":"Lamp, large"}"#);
        assert_eq!(&rows[0][7], "name");
        assert_eq!(&rows[0][8], "user-1");
    }

    #[test]
    fn test_csv_export_header_only() {
        let mut output = Vec::new();
        export_audit_csv(&[], &mut output).unwrap();

        let csv = String::from_utf8(output).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("id,timestamp,entity_kind"));
    }
}
