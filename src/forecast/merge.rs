//! Forecast merge
//!
//! Produces a grid with an extra `Forecast` column: historical rows carry a
//! null forecast except the last one, which repeats its own value so a chart
//! line joins history to prediction; predictions become new rows.

use crate::db::types::{CellValue, ResultSet};
use crate::error::ForecastResult;
use crate::forecast::columns::identify_columns;
use crate::forecast::{ForecastPoint, date_key};
use serde::Serialize;
use std::collections::HashSet;

/// Name of the appended column
pub const FORECAST_COLUMN: &str = "Forecast";

/// Historical grid plus a trailing forecast column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugmentedResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    pub date_column: usize,
    pub value_column: usize,
}

impl AugmentedResultSet {
    pub fn forecast_index(&self) -> usize {
        self.columns.len() - 1
    }

    /// Drop the positional metadata, keeping only the grid
    pub fn into_result_set(self) -> ResultSet {
        ResultSet::new(self.columns, self.rows)
    }
}

/// Merge `predictions` into `historical`
///
/// Rows missing a date or value are dropped. A prediction whose date already
/// appears (in history or an earlier prediction) is skipped, never overwritten.
pub fn merge(
    historical: &ResultSet,
    predictions: &[ForecastPoint],
) -> ForecastResult<AugmentedResultSet> {
    let (date_idx, value_idx) = identify_columns(historical)?;

    let mut rows: Vec<Vec<CellValue>> = historical
        .rows
        .iter()
        .filter(|row| {
            let present = |i: usize| row.get(i).is_some_and(|c| !c.is_null());
            present(date_idx) && present(value_idx)
        })
        .map(|row| {
            let mut row = row.clone();
            row.resize(historical.columns.len(), CellValue::Null);
            row.push(CellValue::Null);
            row
        })
        .collect();

    if let Some(last) = rows.last_mut() {
        let forecast_idx = last.len() - 1;
        last[forecast_idx] = last[value_idx].clone();
    }

    let mut seen: HashSet<String> = rows.iter().map(|row| date_key(&row[date_idx])).collect();

    for point in predictions {
        let key = point.date.format("%Y-%m-%d").to_string();
        if !seen.insert(key.clone()) {
            continue;
        }
        let mut row = vec![CellValue::Null; historical.columns.len() + 1];
        row[date_idx] = CellValue::Text(key);
        row[historical.columns.len()] = CellValue::Float(point.value);
        rows.push(row);
    }

    let mut columns = historical.columns.clone();
    columns.push(FORECAST_COLUMN.to_string());

    Ok(AugmentedResultSet {
        columns,
        rows,
        date_column: date_idx,
        value_column: value_idx,
    })
}
