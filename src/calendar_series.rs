//! Daily close series construction and persistence.

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::investing_history::{write_atomic, HistoryRow};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One close per calendar day, strictly ascending, no holes. `new` is the
/// only constructor and re-checks the invariant on every build.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    points: Vec<DailyPoint>,
}

impl DailySeries {
    pub fn new(points: Vec<DailyPoint>) -> Result<Self, SeriesError> {
        for pair in points.windows(2) {
            let prev = pair[0].date;
            let next = pair[1].date;
            if next == prev {
                return Err(SeriesError::DuplicateDate { date: next });
            }
            if next < prev {
                return Err(SeriesError::OutOfOrder { prev, next });
            }
            if prev.succ_opt() != Some(next) {
                return Err(SeriesError::CalendarGap { prev, next });
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[DailyPoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.close).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|point| point.date).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesBuildReport {
    pub input_rows: u64,
    pub duplicate_dates_removed: u64,
    pub filled_days: u64,
    pub span_days: u64,
}

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("no rows to build a series from")]
    Empty,
    #[error("invalid unix timestamp {value} in row {index}")]
    InvalidTimestamp { index: usize, value: i64 },
    #[error("invalid close value '{value}' in row {index}")]
    InvalidClose { index: usize, value: String },
    #[error("duplicate date {date} in series")]
    DuplicateDate { date: NaiveDate },
    #[error("series dates out of order: {prev} followed by {next}")]
    OutOfOrder { prev: NaiveDate, next: NaiveDate },
    #[error("calendar gap between {prev} and {next}")]
    CalendarGap { prev: NaiveDate, next: NaiveDate },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

// Sort, drop duplicate dates keeping the first occurrence, then carry the
// previous close across days the provider omits (weekends, holidays).
pub fn build_daily_series(
    rows: &[HistoryRow],
) -> Result<(DailySeries, SeriesBuildReport), SeriesError> {
    if rows.is_empty() {
        return Err(SeriesError::Empty);
    }

    let mut parsed = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let date =
            date_from_unix_seconds(row.row_date_raw).ok_or(SeriesError::InvalidTimestamp {
                index,
                value: row.row_date_raw,
            })?;
        let close =
            parse_localized_decimal(&row.last_close).ok_or_else(|| SeriesError::InvalidClose {
                index,
                value: row.last_close.clone(),
            })?;
        parsed.push(DailyPoint { date, close });
    }

    parsed.sort_by_key(|point| point.date);

    let mut deduped: Vec<DailyPoint> = Vec::with_capacity(parsed.len());
    let mut duplicate_dates_removed = 0u64;
    for point in parsed {
        if deduped
            .last()
            .map(|existing| existing.date == point.date)
            .unwrap_or(false)
        {
            duplicate_dates_removed += 1;
        } else {
            deduped.push(point);
        }
    }

    let mut filled: Vec<DailyPoint> = Vec::with_capacity(deduped.len());
    let mut filled_days = 0u64;
    for point in deduped {
        while let Some(prev) = filled.last().copied() {
            let Some(next_date) = prev.date.succ_opt() else {
                break;
            };
            if next_date >= point.date {
                break;
            }
            filled.push(DailyPoint {
                date: next_date,
                close: prev.close,
            });
            filled_days += 1;
        }
        filled.push(point);
    }

    let report = SeriesBuildReport {
        input_rows: rows.len() as u64,
        duplicate_dates_removed,
        filled_days,
        span_days: filled.len() as u64,
    };

    info!(
        component = "calendar_series",
        event = "series.build.finish",
        input_rows = report.input_rows,
        duplicate_dates_removed = report.duplicate_dates_removed,
        filled_days = report.filled_days,
        span_days = report.span_days
    );

    let series = DailySeries::new(filled)?;
    Ok((series, report))
}

pub fn write_series_csv(path: &Path, series: &DailySeries) -> Result<(), SeriesError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for point in series.points() {
        writer.serialize(point)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;
    write_atomic(path, &bytes)?;

    info!(
        component = "calendar_series",
        event = "series.csv.written",
        path = %path.display(),
        rows = series.len()
    );
    Ok(())
}

pub fn read_series_csv(path: &Path) -> Result<DailySeries, SeriesError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut points = Vec::new();
    for record in reader.deserialize() {
        let point: DailyPoint = record?;
        points.push(point);
    }
    DailySeries::new(points)
}

fn date_from_unix_seconds(ts: i64) -> Option<NaiveDate> {
    Utc.timestamp_opt(ts, 0).single().map(|dt| dt.date_naive())
}

// Accepts pt-BR localized decimals ("134.185,43") and plain decimals. With a
// comma present, dots are thousands separators; without one they are decimal
// points.
fn parse_localized_decimal(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if trimmed.contains(',') {
        trimmed.replace('.', "").replace(',', ".")
    } else {
        trimmed.to_string()
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
