//! Result export (CSV / JSON)
//!
//! Pure serialization functions with no filesystem I/O. The caller writes
//! the returned string wherever it needs to go.

use crate::db::types::{CellValue, ResultSet};
use crate::forecast::AugmentedResultSet;

/// Anything that looks like a result grid
pub trait Grid {
    fn column_names(&self) -> &[String];
    fn grid_rows(&self) -> &[Vec<CellValue>];
}

impl Grid for ResultSet {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn grid_rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }
}

impl Grid for AugmentedResultSet {
    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn grid_rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }
}

/// Serialize a grid as RFC 4180 CSV.
pub fn to_csv(grid: &impl Grid) -> String {
    let mut out = String::new();

    // Header row
    for (i, col) in grid.column_names().iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        csv_escape_into(&mut out, col);
    }
    out.push('\n');

    // Data rows
    for row in grid.grid_rows() {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            let text = cell_to_export_string(cell);
            csv_escape_into(&mut out, &text);
        }
        out.push('\n');
    }

    out
}

/// Serialize a grid as a JSON array of objects with typed values.
pub fn to_json(grid: &impl Grid) -> String {
    let col_names = grid.column_names();

    let rows: Vec<serde_json::Value> = grid
        .grid_rows()
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (i, cell) in row.iter().enumerate() {
                let key = col_names.get(i).map(String::as_str).unwrap_or("?");
                obj.insert(key.to_string(), cell_to_json(cell));
            }
            serde_json::Value::Object(obj)
        })
        .collect();

    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

/// Full untruncated value string for CSV export (NULL → empty string).
fn cell_to_export_string(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => String::new(),
        CellValue::Integer(i) => i.to_string(),
        CellValue::Float(f) => f.to_string(),
        CellValue::Text(s) => s.clone(),
    }
}

/// Convert a CellValue to a serde_json::Value with type preservation.
fn cell_to_json(cell: &CellValue) -> serde_json::Value {
    match cell {
        CellValue::Null => serde_json::Value::Null,
        CellValue::Integer(i) => serde_json::json!(*i),
        CellValue::Float(f) => {
            if f.is_finite() {
                serde_json::json!(*f)
            } else {
                // NaN / Infinity aren't valid JSON numbers
                serde_json::Value::String(f.to_string())
            }
        }
        CellValue::Text(s) => serde_json::Value::String(s.clone()),
    }
}

/// Quote a field if it contains `,` `"` or a newline (RFC 4180).
fn csv_escape_into(out: &mut String, field: &str) {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push_str("\"\"");
            } else {
                out.push(c);
            }
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
