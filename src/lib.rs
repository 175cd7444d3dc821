//! ibovcast core crate.
//!
//! Current implemented scope:
//! - allow-list validated application configuration
//! - paginated IBOVESPA history fetch with bounded retry
//! - calendar-complete daily close series and CSV persistence
//! - sliding-window aggregation and feature/target split
//! - forecast evaluation against a naive baseline

mod calendar_series;
mod config;
mod evaluation;
mod investing_history;
mod observability;
mod retry;
mod windowing;

pub use calendar_series::{
    build_daily_series, read_series_csv, write_series_csv, DailyPoint, DailySeries,
    SeriesBuildReport, SeriesError,
};
pub use config::{
    load_config, parse_config, AppConfig, ConfigError, DEFAULT_CONFIG_PATH, DEFAULT_DATA_FOLDER,
    DEFAULT_MAX_RETRIES,
};
pub use evaluation::{
    evaluate_forecaster, mean_absolute_percentage_error, train_test_split, write_forecast_report,
    EvalError, ForecastPoint, ForecastReport, Forecaster, NaiveLastForecaster, DEFAULT_TIMESTEPS,
    DEFAULT_TRAIN_FRACTION,
};
pub use investing_history::{
    fetch_full_range, load_raw_history, plan_fetch_ranges, save_raw_history, FetchError,
    FetchRange, HistoryFetchRequest, HistoryProvider, HistoryRow, InvestingHistoryProvider,
    TransportError, DEFAULT_PAIR_ID, DEFAULT_STEP_DAYS,
};
pub use observability::{
    init_logging, log_app_start, log_artifact_written, logging_config_from_env, LogFormat,
    LoggingConfig, LoggingInitError,
};
pub use retry::{RetryPolicy, DEFAULT_RETRY_BACKOFF_MS};
pub use windowing::{aggregate_data_in_timesteps, split_x_y, Window, WindowError};
