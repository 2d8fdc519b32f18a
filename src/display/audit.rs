//! Audit record display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::audit::AuditRecord;

#[derive(Tabled)]
struct AuditRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Op")]
    operation: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Changed")]
    changed: String,
}

impl From<&AuditRecord> for AuditRow {
    fn from(record: &AuditRecord) -> Self {
        Self {
            when: record.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
            operation: record.operation().to_string(),
            kind: record.entity_kind().to_string(),
            key: record.key_display(),
            actor: record.actor_id().unwrap_or("-").to_string(),
            method: record.method().to_string(),
            changed: record.changed_fields().join(", "),
        }
    }
}

/// Format audit records as a table
pub fn format_audit_table(records: &[AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit records found.\n".to_string();
    }

    let mut table = Table::new(records.iter().map(AuditRow::from));
    table.with(Style::psql());
    format!("{}\n", table)
}

/// Format every record with its value changes
pub fn format_audit_details(records: &[AuditRecord]) -> String {
    let mut output = String::new();
    for record in records {
        output.push_str(&record.format_human_readable());
        output.push('\n');
    }
    output
}
