use chrono::NaiveDate;
use ibovcast::{
    evaluate_forecaster, write_forecast_report, DailyPoint, DailySeries, EvalError, ForecastReport,
    Forecaster, NaiveLastForecaster,
};
use tempfile::tempdir;

#[test]
fn naive_baseline_on_ten_closes_scores_exactly() {
    let closes: Vec<f64> = (1..=10).map(f64::from).collect();
    let series = series_from_closes(date(2024, 1, 1), &closes);

    let report = evaluate_forecaster(&series, 2, 0.8, &NaiveLastForecaster).expect("evaluate");

    assert_eq!(report.forecaster, "naive_last");
    assert_eq!(report.timesteps, 2);
    assert_eq!(report.points.len(), 1);
    assert_eq!(report.points[0].date, date(2024, 1, 10));
    assert_eq!(report.points[0].actual, 10.0);
    assert_eq!(report.points[0].predicted, 9.0);
    assert!((report.mape - 0.1).abs() < 1e-12);
}

#[test]
fn every_point_pairs_the_target_with_its_calendar_date() {
    let start = date(2024, 1, 1);
    let closes: Vec<f64> = (0..40).map(|day| 100.0 + day as f64).collect();
    let series = series_from_closes(start, &closes);

    let report = evaluate_forecaster(&series, 7, 0.5, &NaiveLastForecaster).expect("evaluate");

    assert_eq!(report.points.len(), 14);
    for point in &report.points {
        let day_index = (point.date - start).num_days() as usize;
        assert_eq!(point.actual, closes[day_index]);
        assert_eq!(point.predicted, closes[day_index - 1]);
    }
    assert_eq!(report.points[0].date, date(2024, 1, 27));
    assert_eq!(
        report.points.last().expect("points").date,
        date(2024, 2, 9)
    );
}

#[test]
fn a_test_slice_shorter_than_the_window_is_rejected() {
    let closes: Vec<f64> = (1..=10).map(f64::from).collect();
    let series = series_from_closes(date(2024, 1, 1), &closes);

    let err =
        evaluate_forecaster(&series, 7, 0.8, &NaiveLastForecaster).expect_err("too short");

    match err {
        EvalError::SeriesTooShort {
            len,
            timesteps,
            train_fraction,
        } => {
            assert_eq!(len, 10);
            assert_eq!(timesteps, 7);
            assert_eq!(train_fraction, 0.8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn wrong_length_predictions_are_rejected() {
    struct TruncatingForecaster;

    impl Forecaster for TruncatingForecaster {
        fn name(&self) -> &str {
            "truncating"
        }

        fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, EvalError> {
            Ok(features.iter().skip(1).map(|row| row[0]).collect())
        }
    }

    let closes: Vec<f64> = (1..=20).map(f64::from).collect();
    let series = series_from_closes(date(2024, 1, 1), &closes);

    let err =
        evaluate_forecaster(&series, 3, 0.5, &TruncatingForecaster).expect_err("count mismatch");

    match err {
        EvalError::PredictionCount { found, expected } => {
            assert_eq!(found, 7);
            assert_eq!(expected, 8);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn report_round_trips_through_its_json_artifact() {
    let closes: Vec<f64> = (1..=15).map(|v| f64::from(v) * 1.5).collect();
    let series = series_from_closes(date(2024, 1, 1), &closes);
    let report = evaluate_forecaster(&series, 3, 0.6, &NaiveLastForecaster).expect("evaluate");

    let temp = tempdir().expect("tempdir");
    let path = temp.path().join("reports").join("forecast.json");
    write_forecast_report(&path, &report).expect("write report");
    assert!(!path.with_file_name("forecast.json.tmp").exists());

    let payload = std::fs::read_to_string(&path).expect("read report");
    let parsed: ForecastReport = serde_json::from_str(&payload).expect("parse report");
    assert_eq!(parsed, report);
}

fn series_from_closes(start: NaiveDate, closes: &[f64]) -> DailySeries {
    let mut points = Vec::with_capacity(closes.len());
    let mut day = start;
    for close in closes {
        points.push(DailyPoint { date: day, close: *close });
        day = day.succ_opt().expect("next day");
    }
    DailySeries::new(points).expect("valid series")
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}
