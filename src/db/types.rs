//! Result data types
//!
//! Core data structures for representing query results as they move
//! through the gateway: pages from the engine, accumulated result sets,
//! and the minimal cell value type.

use serde::Serialize;
use std::time::Duration;

/// A cell value (single column value in a row)
///
/// Engine-specific types are flattened into these four variants by the
/// backend; dates, decimals and the like arrive as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// NULL value
    Null,

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Text/string value
    Text(String),
}

impl CellValue {
    /// Get a display string for this cell value (truncated if needed)
    pub fn display_string(&self, max_len: usize) -> String {
        let full = match self {
            CellValue::Null => "NULL".to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        };

        if full.chars().count() > max_len {
            let kept: String = full.chars().take(max_len.saturating_sub(3)).collect();
            format!("{}...", kept)
        } else {
            full
        }
    }

    /// Check if this is a NULL value
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, parsing text when it holds a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Null => None,
        }
    }
}

/// One page of rows as reported by the engine.
///
/// Engines may stream results in several pages; only some pages carry the
/// column list.
#[derive(Debug, Clone, Default)]
pub struct ResultPage {
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Tabular query result
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSet {
    /// Column names, order-significant
    pub columns: Vec<String>,
    /// Rows, each aligned positionally with `columns`
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Merge engine pages into a single result set.
    ///
    /// The column list comes from the first page that reports one; rows are
    /// appended in arrival order.
    pub fn from_pages(pages: impl IntoIterator<Item = ResultPage>) -> Self {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        for page in pages {
            if columns.is_none() {
                columns = page.columns;
            }
            rows.extend(page.rows);
        }
        Self {
            columns: columns.unwrap_or_default(),
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Outcome of a gateway execution
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub result: ResultSet,
    /// Whether the result was served from the query cache
    pub from_cache: bool,
    /// Wall time spent in the engine (zero for cache hits)
    pub execution_time: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_cell_value_display_string() {
        let val = text("Hello, world!");
        assert_eq!(val.display_string(5), "He...");
        assert_eq!(val.display_string(100), "Hello, world!");
        assert_eq!(CellValue::Null.display_string(10), "NULL");
    }

    #[test]
    fn test_cell_value_is_null() {
        assert!(CellValue::Null.is_null());
        assert!(!CellValue::Integer(42).is_null());
    }

    #[test]
    fn test_as_f64_parses_numeric_text() {
        assert_eq!(text(" 12.5 ").as_f64(), Some(12.5));
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(text("2025-01-01").as_f64(), None);
        assert_eq!(CellValue::Null.as_f64(), None);
    }

    #[test]
    fn test_from_pages_takes_first_reported_columns() {
        let pages = vec![
            ResultPage {
                columns: None,
                rows: vec![],
            },
            ResultPage {
                columns: Some(vec!["a".into(), "b".into()]),
                rows: vec![vec![CellValue::Integer(1), text("x")]],
            },
            ResultPage {
                columns: Some(vec!["ignored".into()]),
                rows: vec![vec![CellValue::Integer(2), text("y")]],
            },
        ];
        let rs = ResultSet::from_pages(pages);
        assert_eq!(rs.columns, vec!["a", "b"]);
        assert_eq!(rs.row_count(), 2);
        assert_eq!(rs.rows[1][0], CellValue::Integer(2));
    }

    #[test]
    fn test_from_pages_empty() {
        let rs = ResultSet::from_pages(Vec::new());
        assert!(rs.columns.is_empty());
        assert!(rs.rows.is_empty());
    }

    #[test]
    fn test_serializes_cells_untagged() {
        let rs = ResultSet::new(
            vec!["n".into(), "s".into()],
            vec![vec![CellValue::Integer(1), CellValue::Null]],
        );
        let json = serde_json::to_string(&rs).unwrap();
        assert_eq!(json, r#"{"columns":["n","s"],"rows":[[1,null]]}"#);
    }
}
