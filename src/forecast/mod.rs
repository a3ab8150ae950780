//! Forecast merging
//!
//! Splices predicted future points into a historical result grid, with a
//! linear-trend fallback for when no external predictions are available.

pub mod columns;
pub mod linear;
pub mod merge;

use crate::db::types::CellValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

pub use columns::identify_columns;
pub use linear::forecast_linear;
pub use merge::{AugmentedResultSet, FORECAST_COLUMN, merge};

/// A single predicted value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl ForecastPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Interpret a cell as a calendar date
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.f]`, RFC 3339 timestamps
/// and `YYYY-MM` (first day of the month).
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    let CellValue::Text(raw) = cell else {
        return None;
    };
    let s = raw.trim();

    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    // Postgres timestamptz text, e.g. "2025-01-01 00:00:00+00"
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d").ok()
}

/// Key used to compare dates across historical rows and predictions
pub(crate) fn date_key(cell: &CellValue) -> String {
    match parse_date(cell) {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => cell.display_string(usize::MAX),
    }
}
