//! Sortable table view over dynamic result rows
//!
//! Rows are arbitrary JSON objects. Columns are the union of top-level keys
//! in first-seen order; cells are looked up dot-path aware so nested fields
//! can be addressed as `Parent.Child`.

use crate::present::format::{format_cell, format_column_name};
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A row set with tri-state sort: clicking the same column cycles
/// ascending, descending, then back to the original order.
#[derive(Debug, Clone)]
pub struct TableView {
    rows: Vec<Value>,
    sort: Option<(String, SortDirection)>,
    preferred_columns: Option<Vec<String>>,
}

impl TableView {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows,
            sort: None,
            preferred_columns: None,
        }
    }

    /// Restrict and order the displayed columns (a scenario's
    /// `displayFields`). Discovery order is used when not set.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.preferred_columns = Some(columns);
        self
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    pub fn sort(&self) -> Option<(&str, SortDirection)> {
        self.sort.as_ref().map(|(c, d)| (c.as_str(), *d))
    }

    /// Union of top-level keys across all rows, first-seen order, unless a
    /// preferred column list was set.
    pub fn columns(&self) -> Vec<String> {
        if let Some(preferred) = &self.preferred_columns {
            return preferred.clone();
        }
        let mut columns = Vec::new();
        for row in &self.rows {
            if let Some(object) = row.as_object() {
                for key in object.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }
        columns
    }

    /// Advance the sort state for a column: unsorted -> ascending ->
    /// descending -> unsorted. Selecting a different column starts it
    /// ascending.
    pub fn cycle_sort(&mut self, column: &str) {
        self.sort = match &self.sort {
            Some((current, SortDirection::Ascending)) if current == column => {
                Some((column.to_string(), SortDirection::Descending))
            }
            Some((current, SortDirection::Descending)) if current == column => None,
            _ => Some((column.to_string(), SortDirection::Ascending)),
        };
    }

    /// Rows in display order. The sort is stable, so ties keep their
    /// original relative order, and null cells sort last in both directions.
    pub fn sorted_rows(&self) -> Vec<&Value> {
        let mut rows: Vec<&Value> = self.rows.iter().collect();
        if let Some((column, direction)) = &self.sort {
            rows.sort_by(|a, b| {
                let a_val = get_path(a, column).filter(|v| !v.is_null());
                let b_val = get_path(b, column).filter(|v| !v.is_null());
                match (a_val, b_val) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Greater,
                    (Some(_), None) => Ordering::Less,
                    (Some(a), Some(b)) => {
                        let ordering = compare_cells(a, b);
                        match direction {
                            SortDirection::Ascending => ordering,
                            SortDirection::Descending => ordering.reverse(),
                        }
                    }
                }
            });
        }
        rows
    }

    /// Render as fixed-width text for terminal output.
    pub fn to_text(&self) -> String {
        let columns = self.columns();
        if columns.is_empty() {
            return "No data to display\n".to_string();
        }

        let headers: Vec<String> = columns.iter().map(|c| format_column_name(c)).collect();
        let body: Vec<Vec<String>> = self
            .sorted_rows()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| format_cell(get_path(row, c)))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let render_line = |cells: &[String], widths: &[usize]| {
            cells
                .iter()
                .zip(widths.iter().copied())
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        out.push_str(&render_line(&headers, &widths));
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        out.push('\n');
        for row in &body {
            out.push_str(&render_line(row, &widths));
            out.push('\n');
        }
        out
    }
}

/// Dot-path aware lookup of a nested field. Missing segments and explicit
/// nulls both come back as None.
pub fn get_path<'v>(row: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = row;
    for part in path.split('.') {
        current = current.get(part)?;
        if current.is_null() {
            return None;
        }
    }
    Some(current)
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            // Approximates locale collation: case-insensitive first, raw
            // bytes as the tiebreak.
            let folded = x.to_lowercase().cmp(&y.to_lowercase());
            if folded == Ordering::Equal {
                x.cmp(y)
            } else {
                folded
            }
        }
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}
