use std::path::PathBuf;

use ibovcast::{
    evaluate_forecaster, init_logging, load_config, log_app_start, log_artifact_written,
    logging_config_from_env, read_series_csv, write_forecast_report, NaiveLastForecaster,
    DEFAULT_CONFIG_PATH, DEFAULT_TIMESTEPS, DEFAULT_TRAIN_FRACTION,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("forecast_eval", &logging_cfg);

    let config_path = config_path_from_env();
    let config = load_config(&config_path)?;
    let timesteps = parse_timesteps();
    let train_fraction = parse_train_fraction();

    let csv_path = config.series_csv_path();
    println!(
        "Forecast eval start | series={} timesteps={} train_fraction={}",
        csv_path.display(),
        timesteps,
        train_fraction
    );

    let series = read_series_csv(&csv_path)?;
    let forecaster = NaiveLastForecaster;
    let report = evaluate_forecaster(&series, timesteps, train_fraction, &forecaster)?;

    let report_path = config.forecast_report_path();
    write_forecast_report(&report_path, &report)?;
    log_artifact_written("forecast_eval", &report_path, report.points.len());

    println!(
        "Forecast eval complete | forecaster={} points={} mape={:.4}% path={}",
        report.forecaster,
        report.points.len(),
        report.mape * 100.0,
        report_path.display()
    );
    Ok(())
}

fn config_path_from_env() -> PathBuf {
    std::env::var("IBOVCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn parse_timesteps() -> usize {
    if let Ok(raw) = std::env::var("IBOVCAST_TIMESTEPS") {
        raw.trim()
            .parse()
            .expect("IBOVCAST_TIMESTEPS must be a positive integer")
    } else {
        DEFAULT_TIMESTEPS
    }
}

fn parse_train_fraction() -> f64 {
    if let Ok(raw) = std::env::var("IBOVCAST_TRAIN_FRACTION") {
        raw.trim()
            .parse()
            .expect("IBOVCAST_TRAIN_FRACTION must be a number in (0, 1)")
    } else {
        DEFAULT_TRAIN_FRACTION
    }
}
