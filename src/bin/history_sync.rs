use std::path::PathBuf;

use ibovcast::{
    fetch_full_range, init_logging, load_config, log_app_start, log_artifact_written,
    logging_config_from_env, save_raw_history, HistoryFetchRequest, InvestingHistoryProvider,
    RetryPolicy, DEFAULT_CONFIG_PATH,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_cfg = logging_config_from_env();
    init_logging(&logging_cfg)?;
    log_app_start("history_sync", &logging_cfg);

    let config_path = config_path_from_env();
    let config = load_config(&config_path)?;

    println!(
        "History sync start | config={} range={}..{} max_retries={}",
        config_path.display(),
        config.start_date,
        config.end_date,
        config.max_retries
    );

    let provider = InvestingHistoryProvider::new()?;
    let policy = RetryPolicy::new(config.max_retries);
    let request = HistoryFetchRequest::new(config.start_date, config.end_date);
    let rows = fetch_full_range(&provider, &request, &policy)?;

    let raw_path = config.raw_history_path();
    save_raw_history(&raw_path, &rows)?;
    log_artifact_written("history_sync", &raw_path, rows.len());

    println!(
        "History sync complete | rows={} path={}",
        rows.len(),
        raw_path.display()
    );
    Ok(())
}

fn config_path_from_env() -> PathBuf {
    std::env::var("IBOVCAST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}
