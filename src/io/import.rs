//! CSV import of the metered load and solar-yield series.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::series::TimeSeriesPoint;

/// Timestamp layouts accepted in the input CSV, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Import error with file context and row number where applicable.
#[derive(Debug)]
pub struct IoError {
    /// What was being read.
    pub context: String,
    /// Underlying failure description.
    pub message: String,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "io error: {} — {}", self.context, self.message)
    }
}

impl std::error::Error for IoError {}

/// One raw CSV row. Every column is optional so sparse exports from
/// metering portals still load.
#[derive(Debug, Deserialize)]
struct RawRow {
    timestamp: Option<String>,
    load_kw: Option<f64>,
    solar_unit: Option<f64>,
    time_step_hours: Option<f64>,
}

/// Reads a time series from a CSV file.
///
/// Expects a header row with `timestamp`, `load_kw`, `solar_unit`, and
/// optionally `time_step_hours` columns.
///
/// # Errors
///
/// Returns an [`IoError`] if the file cannot be opened or a row fails to
/// parse as the expected schema.
pub fn read_series_file(path: &Path) -> Result<Vec<TimeSeriesPoint>, IoError> {
    let file = File::open(path).map_err(|e| IoError {
        context: format!("open \"{}\"", path.display()),
        message: e.to_string(),
    })?;
    read_series_csv(io::BufReader::new(file))
}

/// Reads a time series from any CSV reader.
///
/// Missing numeric cells default to 0 kW load, 0 solar yield, and 1-hour
/// steps. A timestamp that matches none of the accepted layouts is kept
/// as absent rather than failing the row; downstream tariff
/// classification treats such rows as normal-band.
///
/// # Errors
///
/// Returns an [`IoError`] on malformed CSV structure or non-numeric
/// values in numeric columns, with the offending row number.
pub fn read_series_csv(reader: impl Read) -> Result<Vec<TimeSeriesPoint>, IoError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut series = Vec::new();
    for (index, record) in rdr.deserialize::<RawRow>().enumerate() {
        let row = record.map_err(|e| IoError {
            context: format!("csv row {}", index + 2),
            message: e.to_string(),
        })?;
        series.push(TimeSeriesPoint::with_step(
            row.timestamp.as_deref().and_then(parse_timestamp),
            row.load_kw.unwrap_or(0.0),
            row.solar_unit.unwrap_or(0.0),
            row.time_step_hours.unwrap_or(1.0),
        ));
    }
    Ok(series)
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}
