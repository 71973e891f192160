//! CSV export of result rows
//!
//! Rows are flattened first: nested objects become `parent.child` columns,
//! arrays are left as-is and stringified. Quoting is RFC4180 via the csv
//! crate (quote only when a value contains a comma, quote, or newline).

use crate::error::Result;
use chrono::NaiveDate;
use serde_json::Value;

/// Flatten one row into ordered (path, value) pairs. Nested objects recurse;
/// arrays and scalars stop the recursion.
pub fn flatten_row(row: &Value) -> Vec<(String, Value)> {
    let mut flattened = Vec::new();
    flatten_into(row, "", &mut flattened);
    flattened
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match nested {
                    Value::Object(_) => flatten_into(nested, &path, out),
                    _ => out.push((path, nested.clone())),
                }
            }
        }
        _ if prefix.is_empty() => {}
        _ => out.push((prefix.to_string(), value.clone())),
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => value.to_string(),
        other => other.to_string(),
    }
}

/// Produce CSV text for a row set, in the order given (callers pass the
/// currently sorted rows). Header row is the union of flattened columns in
/// first-seen order.
pub fn export_csv<'r>(rows: impl IntoIterator<Item = &'r Value>) -> Result<String> {
    let flattened: Vec<Vec<(String, Value)>> = rows.into_iter().map(flatten_row).collect();

    let mut columns: Vec<String> = Vec::new();
    for row in &flattened {
        for (path, _) in row {
            if !columns.iter().any(|c| c == path) {
                columns.push(path.clone());
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in &flattened {
        let record: Vec<String> = columns
            .iter()
            .map(|column| {
                row.iter()
                    .find(|(path, _)| path == column)
                    .map(|(_, value)| cell_text(value))
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::Error::Other(format!("CSV buffer error: {e}")))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export filename: scenario name (or a default) plus the ISO date.
pub fn export_filename(scenario_name: Option<&str>, date: NaiveDate) -> String {
    format!("{}-{date}.csv", scenario_name.unwrap_or("xero-query"))
}
