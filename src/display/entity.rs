//! Entity row display formatting

use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::models::{EntitySchema, Row};

/// Render a value for a table cell
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Format rows as a table, one column per schema field
pub fn format_rows(schema: &EntitySchema, rows: &[Row]) -> String {
    if rows.is_empty() {
        return format!("No {} rows found.\n", schema.kind);
    }

    let mut builder = Builder::default();
    builder.push_record(schema.fields.iter().map(|f| f.name.clone()));
    for row in rows {
        builder.push_record(
            schema
                .fields
                .iter()
                .map(|f| row.get(&f.name).map(format_value).unwrap_or_default()),
        );
    }

    let mut table = builder.build();
    table.with(Style::psql());
    format!("{}\n", table)
}
