//! Diff generation for audit records
//!
//! Generates human-readable summaries of the old and new field values held
//! by an audit record.

use serde_json::Value;
use std::collections::BTreeMap;

use super::codec::ValueCodec;

/// Generate a human-readable diff between old and new field values
///
/// Fields present on only one side are shown as added or removed. Fields
/// present on both sides are listed only when their canonical forms differ;
/// nested objects are expanded to dotted paths.
pub fn generate_diff(
    old_values: &BTreeMap<String, Value>,
    new_values: &BTreeMap<String, Value>,
) -> Option<String> {
    let mut changes = Vec::new();

    for (key, old_val) in old_values {
        match new_values.get(key) {
            Some(new_val) => changes.extend(generate_detailed_diff(old_val, new_val, key)),
            None => changes.push(format!("{}: {} -> (removed)", key, format_value(old_val))),
        }
    }

    for (key, new_val) in new_values {
        if !old_values.contains_key(key) {
            changes.push(format!("{}: (added) -> {}", key, format_value(new_val)));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

/// Generate a detailed diff that includes nested changes
pub fn generate_detailed_diff(before: &Value, after: &Value, prefix: &str) -> Vec<String> {
    let mut changes = Vec::new();

    if ValueCodec::equal(before, after) {
        return changes;
    }

    match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            for (key, before_val) in before_obj {
                let field_prefix = join_path(prefix, key);
                match after_obj.get(key) {
                    Some(after_val) => {
                        changes.extend(generate_detailed_diff(before_val, after_val, &field_prefix))
                    }
                    None => changes.push(format!(
                        "{}: {} -> (removed)",
                        field_prefix,
                        format_value(before_val)
                    )),
                }
            }

            for (key, after_val) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!(
                        "{}: (added) -> {}",
                        join_path(prefix, key),
                        format_value(after_val)
                    ));
                }
            }
        }
        _ => changes.push(format!(
            "{}: {} -> {}",
            prefix,
            format_value(before),
            format_value(after)
        )),
    }

    changes
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Format a JSON value for human-readable display
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            // Truncate long strings
            if s.chars().count() > 50 {
                let head: String = s.chars().take(47).collect();
                format!("\"{}...\"", head)
            } else {
                format!("\"{}\"", s)
            }
        }
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}
