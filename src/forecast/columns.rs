//! Date/value column sniffing

use crate::db::types::ResultSet;
use crate::error::{ForecastError, ForecastResult};

/// Substrings that mark a column as holding dates
const DATE_TOKENS: &[&str] = &["date", "time", "day", "month"];

/// Indices of the date column and the value column of `result`
///
/// The date column is the first whose name contains a date token; the value
/// column is the first other column whose first row is numeric.
pub fn identify_columns(result: &ResultSet) -> ForecastResult<(usize, usize)> {
    if result.rows.len() < 2 {
        return Err(ForecastError::UnidentifiableColumns(format!(
            "need at least 2 rows, got {}",
            result.rows.len()
        )));
    }

    let date_idx = result
        .columns
        .iter()
        .position(|name| {
            let lower = name.to_lowercase();
            DATE_TOKENS.iter().any(|token| lower.contains(token))
        })
        .ok_or_else(|| ForecastError::UnidentifiableColumns("no date column".into()))?;

    let first_row = &result.rows[0];
    let value_idx = (0..result.columns.len())
        .filter(|&i| i != date_idx)
        .find(|&i| first_row.get(i).and_then(|c| c.as_f64()).is_some())
        .ok_or_else(|| ForecastError::UnidentifiableColumns("no numeric value column".into()))?;

    Ok((date_idx, value_idx))
}
