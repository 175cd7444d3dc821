//! Forecast evaluation over windowed daily series.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::calendar_series::DailySeries;
use crate::investing_history::write_atomic;
use crate::windowing::{aggregate_data_in_timesteps, split_x_y, WindowError};

pub const DEFAULT_TIMESTEPS: usize = 7;
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("train_fraction must be within (0, 1), got {0}")]
    InvalidTrainFraction(f64),
    #[error("series of {len} points is too short for timesteps {timesteps} at train_fraction {train_fraction}")]
    SeriesTooShort {
        len: usize,
        timesteps: usize,
        train_fraction: f64,
    },
    #[error("feature row {index} is empty")]
    EmptyFeatureRow { index: usize },
    #[error("prediction count {found} does not match target count {expected}")]
    PredictionCount { found: usize, expected: usize },
    #[error("actual and predicted lengths differ: {actual} vs {predicted}")]
    LengthMismatch { actual: usize, predicted: usize },
    #[error("percentage error undefined for empty input")]
    EmptyInput,
    #[error("window error: {0}")]
    Window(#[from] WindowError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait Forecaster {
    fn name(&self) -> &str;
    /// One prediction per feature row, in row order.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, EvalError>;
}

/// Predicts that tomorrow closes where today did. Baseline for anything
/// trained externally.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveLastForecaster;

impl Forecaster for NaiveLastForecaster {
    fn name(&self) -> &str {
        "naive_last"
    }

    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
        let mut out = Vec::with_capacity(features.len());
        for (index, row) in features.iter().enumerate() {
            let last = row
                .last()
                .copied()
                .ok_or(EvalError::EmptyFeatureRow { index })?;
            out.push(last);
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastReport {
    pub forecaster: String,
    pub timesteps: usize,
    pub train_fraction: f64,
    pub mape: f64,
    pub generated_at_utc: String,
    pub points: Vec<ForecastPoint>,
}

// train_len = floor(len * fraction), matching the usual truncating split.
pub fn train_test_split(
    values: &[f64],
    train_fraction: f64,
) -> Result<(&[f64], &[f64]), EvalError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(EvalError::InvalidTrainFraction(train_fraction));
    }
    let train_len = (values.len() as f64 * train_fraction) as usize;
    Ok((&values[..train_len], &values[train_len..]))
}

pub fn mean_absolute_percentage_error(
    actual: &[f64],
    predicted: &[f64],
) -> Result<f64, EvalError> {
    if actual.len() != predicted.len() {
        return Err(EvalError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(EvalError::EmptyInput);
    }

    let mut total = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        let denominator = a.abs().max(f64::EPSILON);
        total += (a - p).abs() / denominator;
    }
    Ok(total / actual.len() as f64)
}

// Each evaluated target is the close at dates[train_len + timesteps - 1 + k]
// for window k of the test slice; the report pairs it with that date.
pub fn evaluate_forecaster(
    series: &DailySeries,
    timesteps: usize,
    train_fraction: f64,
    forecaster: &dyn Forecaster,
) -> Result<ForecastReport, EvalError> {
    let closes = series.closes();
    let dates = series.dates();
    let (train, test) = train_test_split(&closes, train_fraction)?;
    let train_len = train.len();

    let windows = aggregate_data_in_timesteps(test, timesteps)?;
    if windows.is_empty() {
        return Err(EvalError::SeriesTooShort {
            len: closes.len(),
            timesteps,
            train_fraction,
        });
    }
    let (features, targets) = split_x_y(&windows, timesteps)?;

    let predicted = forecaster.predict(&features)?;
    if predicted.len() != targets.len() {
        return Err(EvalError::PredictionCount {
            found: predicted.len(),
            expected: targets.len(),
        });
    }

    let actual: Vec<f64> = targets.iter().map(|row| row[0]).collect();
    let mape = mean_absolute_percentage_error(&actual, &predicted)?;

    let target_dates = &dates[train_len + timesteps - 1..];
    let points = target_dates
        .iter()
        .zip(actual.iter().zip(&predicted))
        .map(|(date, (actual, predicted))| ForecastPoint {
            date: *date,
            actual: *actual,
            predicted: *predicted,
        })
        .collect();

    info!(
        component = "evaluation",
        event = "evaluation.finish",
        forecaster = forecaster.name(),
        timesteps,
        train_fraction,
        evaluated_points = actual.len(),
        mape
    );

    Ok(ForecastReport {
        forecaster: forecaster.name().to_string(),
        timesteps,
        train_fraction,
        mape,
        generated_at_utc: Utc::now().to_rfc3339(),
        points,
    })
}

pub fn write_forecast_report(path: &Path, report: &ForecastReport) -> Result<(), EvalError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_vec_pretty(report)?;
    write_atomic(path, &payload)?;

    info!(
        component = "evaluation",
        event = "evaluation.report.written",
        path = %path.display(),
        points = report.points.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_truncates_toward_the_train_side() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let (train, test) = train_test_split(&values, 0.8).unwrap();
        assert_eq!(train.len(), 8);
        assert_eq!(test, &[9.0, 10.0]);

        let values: Vec<f64> = (1..=7).map(f64::from).collect();
        let (train, test) = train_test_split(&values, 0.5).unwrap();
        assert_eq!(train.len(), 3);
        assert_eq!(test.len(), 4);
    }

    #[test]
    fn out_of_range_fractions_are_rejected() {
        for fraction in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = train_test_split(&[1.0, 2.0], fraction).unwrap_err();
            assert!(matches!(err, EvalError::InvalidTrainFraction(_)));
        }
    }

    #[test]
    fn mape_is_the_mean_relative_absolute_error() {
        let mape = mean_absolute_percentage_error(&[10.0, 20.0], &[9.0, 22.0]).unwrap();
        let expected = ((1.0 / 10.0) + (2.0 / 20.0)) / 2.0;
        assert!((mape - expected).abs() < 1e-12);
    }

    #[test]
    fn mape_clamps_zero_actuals_instead_of_dividing_by_zero() {
        let mape = mean_absolute_percentage_error(&[0.0], &[0.0]).unwrap();
        assert_eq!(mape, 0.0);

        let mape = mean_absolute_percentage_error(&[0.0], &[1.0]).unwrap();
        assert!(mape.is_finite());
        assert!(mape > 0.0);
    }

    #[test]
    fn mape_rejects_mismatched_and_empty_inputs() {
        assert!(matches!(
            mean_absolute_percentage_error(&[1.0], &[1.0, 2.0]).unwrap_err(),
            EvalError::LengthMismatch {
                actual: 1,
                predicted: 2,
            }
        ));
        assert!(matches!(
            mean_absolute_percentage_error(&[], &[]).unwrap_err(),
            EvalError::EmptyInput
        ));
    }

    #[test]
    fn naive_forecaster_repeats_each_rows_last_feature() {
        let features = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let predicted = NaiveLastForecaster.predict(&features).unwrap();
        assert_eq!(predicted, vec![3.0, 6.0]);

        let err = NaiveLastForecaster.predict(&[Vec::new()]).unwrap_err();
        assert!(matches!(err, EvalError::EmptyFeatureRow { index: 0 }));
    }
}
