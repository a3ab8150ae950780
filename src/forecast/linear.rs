//! Linear-trend fallback forecaster
//!
//! Ordinary least squares over (timestamp, value), extrapolated at the
//! series' mean spacing.

use crate::db::types::ResultSet;
use crate::error::{ForecastError, ForecastResult};
use crate::forecast::columns::identify_columns;
use crate::forecast::{ForecastPoint, parse_date};
use chrono::DateTime;

/// Fitted line `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Least-squares fit over `points`
///
/// Fails with `InsufficientData` for fewer than two points or when every x
/// is the same.
pub fn fit(points: &[(f64, f64)]) -> ForecastResult<LinearFit> {
    if points.len() < 2 {
        return Err(ForecastError::InsufficientData(format!(
            "need at least 2 points, got {}",
            points.len()
        )));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });

    if sxx == 0.0 {
        return Err(ForecastError::InsufficientData(
            "all points share the same timestamp".into(),
        ));
    }

    let slope = sxy / sxx;
    Ok(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Extend `points` by `horizon` steps of the mean spacing
///
/// `points` must be sorted by x.
pub fn extrapolate(points: &[(f64, f64)], horizon: usize) -> ForecastResult<Vec<(f64, f64)>> {
    let line = fit(points)?;
    let (first_x, last_x) = (points[0].0, points[points.len() - 1].0);
    let interval = (last_x - first_x) / (points.len() - 1) as f64;

    Ok((1..=horizon)
        .map(|step| {
            let x = last_x + interval * step as f64;
            (x, line.predict(x))
        })
        .collect())
}

/// Forecast `horizon` future points from a historical result set
///
/// Timestamps are seconds since the Unix epoch at midnight UTC of each date.
pub fn forecast_linear(historical: &ResultSet, horizon: usize) -> ForecastResult<Vec<ForecastPoint>> {
    let (date_idx, value_idx) = identify_columns(historical)?;

    let mut points: Vec<(f64, f64)> = historical
        .rows
        .iter()
        .filter_map(|row| {
            let date = parse_date(row.get(date_idx)?)?;
            let value = row.get(value_idx)?.as_f64()?;
            let ts = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
            Some((ts as f64, value))
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    extrapolate(&points, horizon)?
        .into_iter()
        .map(|(x, value)| {
            let date = DateTime::from_timestamp(x.round() as i64, 0)
                .ok_or_else(|| ForecastError::InsufficientData("timestamp out of range".into()))?
                .date_naive();
            Ok(ForecastPoint { date, value })
        })
        .collect()
}
