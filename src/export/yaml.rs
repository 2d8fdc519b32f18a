//! YAML export of the audit log

use std::io::Write;

use super::export_err;
use super::json::AuditExport;
use crate::audit::AuditRecord;
use crate::error::AuditrailResult;

/// Export audit records as YAML with a comment header
pub fn export_audit_yaml<W: Write>(records: &[AuditRecord], writer: &mut W) -> AuditrailResult<()> {
    let export = AuditExport::new(records.to_vec());

    writeln!(writer, "# auditrail audit log export").map_err(export_err)?;
    writeln!(writer, "# Generated: {}", export.exported_at).map_err(export_err)?;
    writeln!(writer, "# Records: {}", export.metadata.record_count).map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, &export).map_err(export_err)
}
