//! Table discovery results
//!
//! Structures produced by multi-catalog table discovery.

use crate::db::types::{CellValue, ResultSet};
use serde::Serialize;

/// A table visible through one configured catalog/schema target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableInfo {
    pub catalog: String,
    pub schema: String,
    /// Table name
    pub name: String,
    /// Columns in ordinal order
    pub columns: Vec<ColumnInfo>,
}

/// A table column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Engine-reported type name
    pub data_type: String,
}

impl TableInfo {
    /// `catalog.schema.table`
    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.name)
    }
}

/// Group a `(table_name, column_name, data_type)` result into tables,
/// preserving the order in which tables first appear.
pub fn tables_from_columns(catalog: &str, schema: &str, result: &ResultSet) -> Vec<TableInfo> {
    let mut tables: Vec<TableInfo> = Vec::new();

    for row in &result.rows {
        let (Some(table), Some(column)) = (cell_text(row.first()), cell_text(row.get(1))) else {
            continue;
        };
        let data_type = cell_text(row.get(2)).unwrap_or_default();

        // Rows arrive ordered by table, so only the last entry can match
        match tables.last_mut() {
            Some(last) if last.name == table => {}
            _ => tables.push(TableInfo {
                catalog: catalog.to_string(),
                schema: schema.to_string(),
                name: table,
                columns: Vec::new(),
            }),
        }
        if let Some(last) = tables.last_mut() {
            last.columns.push(ColumnInfo {
                name: column,
                data_type,
            });
        }
    }

    tables
}

fn cell_text(cell: Option<&CellValue>) -> Option<String> {
    match cell? {
        CellValue::Null => None,
        other => Some(other.display_string(usize::MAX)),
    }
}
