//! Application configuration loading and validation.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_DATA_FOLDER: &str = "data";

const DEFAULT_START_DATE: (i32, u32, u32) = (2000, 12, 27);
const DEFAULT_END_DATE: (i32, u32, u32) = (2024, 1, 30);

const ALLOWED_KEYS: [&str; 4] = ["start_date", "end_date", "max_retries", "data_folder"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_retries: u32,
    pub data_folder: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let (start_year, start_month, start_day) = DEFAULT_START_DATE;
        let (end_year, end_month, end_day) = DEFAULT_END_DATE;
        Self {
            start_date: NaiveDate::from_ymd_opt(start_year, start_month, start_day)
                .expect("default start date should be valid"),
            end_date: NaiveDate::from_ymd_opt(end_year, end_month, end_day)
                .expect("default end date should be valid"),
            max_retries: DEFAULT_MAX_RETRIES,
            data_folder: PathBuf::from(DEFAULT_DATA_FOLDER),
        }
    }
}

impl AppConfig {
    pub fn raw_history_path(&self) -> PathBuf {
        self.data_folder
            .join(format!("from_{}_to_{}.json", self.start_date, self.end_date))
    }

    pub fn series_csv_path(&self) -> PathBuf {
        self.data_folder.join(format!(
            "series_from_{}_to_{}.csv",
            self.start_date, self.end_date
        ))
    }

    pub fn forecast_report_path(&self) -> PathBuf {
        self.data_folder.join(format!(
            "forecast_report_from_{}_to_{}.json",
            self.start_date, self.end_date
        ))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config JSON could not be parsed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config JSON must be an object")]
    NotAnObject,
    #[error("invalid config parameters: {keys:?}")]
    UnknownKeys { keys: Vec<String> },
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("start_date {start} is greater than end_date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<AppConfig, ConfigError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or(ConfigError::NotAnObject)?;

    let unknown: Vec<String> = object
        .keys()
        .filter(|key| !ALLOWED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ConfigError::UnknownKeys { keys: unknown });
    }

    let mut config = AppConfig::default();
    if let Some(field) = object.get("start_date") {
        config.start_date = parse_date_field("start_date", field)?;
    }
    if let Some(field) = object.get("end_date") {
        config.end_date = parse_date_field("end_date", field)?;
    }
    if let Some(field) = object.get("max_retries") {
        config.max_retries = parse_retries_field(field)?;
    }
    if let Some(field) = object.get("data_folder") {
        config.data_folder = parse_folder_field(field)?;
    }

    if config.start_date > config.end_date {
        return Err(ConfigError::StartAfterEnd {
            start: config.start_date,
            end: config.end_date,
        });
    }

    Ok(config)
}

fn parse_date_field(key: &'static str, field: &Value) -> Result<NaiveDate, ConfigError> {
    let raw = field.as_str().ok_or_else(|| ConfigError::InvalidValue {
        key,
        reason: "expected an ISO-8601 date string".to_string(),
    })?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ConfigError::InvalidValue {
        key,
        reason: format!("'{raw}' is not a valid ISO-8601 date"),
    })
}

fn parse_retries_field(field: &Value) -> Result<u32, ConfigError> {
    let raw = field.as_u64().ok_or_else(|| ConfigError::InvalidValue {
        key: "max_retries",
        reason: "expected a positive integer".to_string(),
    })?;
    if raw == 0 {
        return Err(ConfigError::InvalidValue {
            key: "max_retries",
            reason: "must be greater than zero".to_string(),
        });
    }
    u32::try_from(raw).map_err(|_| ConfigError::InvalidValue {
        key: "max_retries",
        reason: format!("{raw} exceeds the supported attempt budget"),
    })
}

fn parse_folder_field(field: &Value) -> Result<PathBuf, ConfigError> {
    let raw = field.as_str().ok_or_else(|| ConfigError::InvalidValue {
        key: "data_folder",
        reason: "expected a path string".to_string(),
    })?;
    if raw.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "data_folder",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(PathBuf::from(raw))
}
