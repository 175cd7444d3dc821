//! Paginated IBOVESPA history fetching from the investing.com API.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::retry::RetryPolicy;

const INVESTING_API_BASE_URL: &str = "https://api.investing.com/api/financialdata/historical";
const API_DOMAIN_ID: &str = "br";
const HTTP_TIMEOUT_MS: u64 = 15_000;
const MAX_CAPTURED_BODY_CHARS: usize = 256;

// Bovespa index pair id on investing.com.
pub const DEFAULT_PAIR_ID: u32 = 17920;
pub const DEFAULT_STEP_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryFetchRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub step_days: u32,
}

impl HistoryFetchRequest {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            step_days: DEFAULT_STEP_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "rowDate", default)]
    pub row_date: String,
    #[serde(rename = "rowDateRaw")]
    pub row_date_raw: i64,
    pub last_close: String,
    #[serde(default)]
    pub last_open: String,
    #[serde(default)]
    pub last_max: String,
    #[serde(default)]
    pub last_min: String,
    #[serde(default)]
    pub volume: String,
    // The provider really does spell it "precent".
    #[serde(default)]
    pub change_precent: String,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    #[serde(default)]
    data: Option<Vec<HistoryRow>>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed with status code {status}")]
    Status { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("payload error: {0}")]
    Payload(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("start_date {start} is greater than end_date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
    #[error("step_days must be greater than zero")]
    InvalidStepDays,
    #[error("fetch aborted for range {range} after {attempts} attempts: {source}")]
    Aborted {
        range: FetchRange,
        attempts: u32,
        source: TransportError,
    },
    #[error("HTTP client build error: {0}")]
    HttpClientBuild(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Ranges are inclusive on both ends. Each range end is clamped to the overall
// end before the termination check, so the final range is always exact.
pub fn plan_fetch_ranges(
    start: NaiveDate,
    end: NaiveDate,
    step_days: u32,
) -> Result<Vec<FetchRange>, FetchError> {
    if start > end {
        return Err(FetchError::StartAfterEnd { start, end });
    }
    if step_days == 0 {
        return Err(FetchError::InvalidStepDays);
    }

    let step = ChronoDuration::days(i64::from(step_days));
    let mut ranges = Vec::new();
    let mut cursor = start;
    loop {
        let range_end = cursor
            .checked_add_signed(step)
            .filter(|candidate| *candidate < end)
            .unwrap_or(end);
        ranges.push(FetchRange {
            start: cursor,
            end: range_end,
        });
        if range_end == end {
            break;
        }
        cursor = range_end.succ_opt().expect("next day should exist");
    }

    Ok(ranges)
}

pub trait HistoryProvider {
    /// `Ok(None)` is the provider's empty-range sentinel, not a failure.
    fn fetch_one(&self, range: &FetchRange) -> Result<Option<Vec<HistoryRow>>, TransportError>;
}

pub struct InvestingHistoryProvider {
    client: reqwest::blocking::Client,
    pair_id: u32,
}

impl InvestingHistoryProvider {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_pair_id(DEFAULT_PAIR_ID)
    }

    pub fn with_pair_id(pair_id: u32) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(HTTP_TIMEOUT_MS))
            .build()
            .map_err(|err| FetchError::HttpClientBuild(err.to_string()))?;
        Ok(Self { client, pair_id })
    }

    fn history_url(&self, range: &FetchRange) -> String {
        format!(
            "{INVESTING_API_BASE_URL}/{}?start-date={}&end-date={}&time-frame=Daily&add-missing-rows=false",
            self.pair_id, range.start, range.end
        )
    }
}

impl HistoryProvider for InvestingHistoryProvider {
    fn fetch_one(&self, range: &FetchRange) -> Result<Option<Vec<HistoryRow>>, TransportError> {
        let url = self.history_url(range);
        debug!(
            component = "investing_history",
            event = "fetch.request",
            url = %url
        );

        let response = self
            .client
            .get(&url)
            .header("domain-id", API_DOMAIN_ID)
            .header("accept", "application/json")
            .send()
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload = response
            .text()
            .map_err(|err| TransportError::Network(err.to_string()))?;
        parse_history_payload(&payload)
    }
}

// Sequential by design: one in-flight request, ranges in ascending order, row
// order preserved across range boundaries. A range that still fails once the
// retry budget is spent aborts the whole fetch.
pub fn fetch_full_range(
    provider: &dyn HistoryProvider,
    req: &HistoryFetchRequest,
    policy: &RetryPolicy,
) -> Result<Vec<HistoryRow>, FetchError> {
    let ranges = plan_fetch_ranges(req.start_date, req.end_date, req.step_days)?;

    info!(
        component = "investing_history",
        event = "fetch.start",
        start_date = %req.start_date,
        end_date = %req.end_date,
        step_days = req.step_days,
        range_count = ranges.len()
    );

    let mut rows = Vec::new();
    for range in &ranges {
        let fetched = policy
            .run("investing.fetch_range", || provider.fetch_one(range))
            .map_err(|source| FetchError::Aborted {
                range: *range,
                attempts: policy.max_attempts(),
                source,
            })?;

        match fetched {
            Some(mut batch) => {
                info!(
                    component = "investing_history",
                    event = "fetch.range.finish",
                    range = %range,
                    rows = batch.len()
                );
                rows.append(&mut batch);
            }
            None => {
                info!(
                    component = "investing_history",
                    event = "fetch.range.empty",
                    range = %range
                );
            }
        }
    }

    info!(
        component = "investing_history",
        event = "fetch.finish",
        range_count = ranges.len(),
        total_rows = rows.len()
    );

    Ok(rows)
}

pub fn save_raw_history(path: &Path, rows: &[HistoryRow]) -> Result<(), FetchError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_vec_pretty(rows)?;
    write_atomic(path, &payload)?;

    info!(
        component = "investing_history",
        event = "fetch.raw.saved",
        path = %path.display(),
        rows = rows.len()
    );
    Ok(())
}

pub fn load_raw_history(path: &Path) -> Result<Vec<HistoryRow>, FetchError> {
    let payload = fs::read(path)?;
    let rows = serde_json::from_slice(&payload)?;
    Ok(rows)
}

fn parse_history_payload(payload: &str) -> Result<Option<Vec<HistoryRow>>, TransportError> {
    let envelope: HistoryEnvelope =
        serde_json::from_str(payload).map_err(|err| TransportError::Payload(err.to_string()))?;
    Ok(envelope.data)
}

fn truncate_body(body: &str) -> String {
    body.trim().chars().take(MAX_CAPTURED_BODY_CHARS).collect()
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid output path: {}", path.display()),
            )
        })?;
    let tmp_path = path.with_file_name(format!("{file_name}.tmp"));

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    fs::rename(tmp_path, path)?;
    Ok(())
}
