use std::path::PathBuf;

use ibovcast::{
    build_daily_series, init_logging, load_config, load_raw_history, log_app_start,
    log_artifact_written, logging_config_from_env, write_series_csv, DEFAULT_CONFIG_PATH,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("series_build", &logging_cfg);

    let config_path = config_path_from_env();
    let config = load_config(&config_path)?;

    let raw_path = config.raw_history_path();
    println!("Series build start | raw={}", raw_path.display());

    let rows = load_raw_history(&raw_path)?;
    let (series, report) = build_daily_series(&rows)?;

    let csv_path = config.series_csv_path();
    write_series_csv(&csv_path, &series)?;
    log_artifact_written("series_build", &csv_path, series.len());

    println!(
        "Series build complete | input_rows={} duplicates_removed={} filled_days={} span_days={} path={}",
        report.input_rows,
        report.duplicate_dates_removed,
        report.filled_days,
        report.span_days,
        csv_path.display()
    );
    Ok(())
}

fn config_path_from_env() -> PathBuf {
    std::env::var("IBOVCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
