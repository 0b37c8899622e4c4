use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use crate::{ReporterError, WeatherRecord, error::StorageError};

/// Column names of the log, in order.
pub const HEADER: [&str; 5] = ["city", "timestamp", "temperature", "humidity", "condition"];

/// Default log file name, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "weather_log.csv";

/// One CSV row. `raw_source` never reaches disk.
#[derive(Debug, Serialize, Deserialize)]
struct LogRow {
    city: String,
    timestamp: DateTime<Utc>,
    temperature: f64,
    humidity: u8,
    condition: String,
}

impl From<&WeatherRecord> for LogRow {
    fn from(record: &WeatherRecord) -> Self {
        Self {
            city: record.city.clone(),
            timestamp: record.timestamp,
            temperature: record.temperature,
            humidity: record.humidity,
            condition: record.condition.clone(),
        }
    }
}

impl TryFrom<LogRow> for WeatherRecord {
    /// Which invariant the row breaks.
    type Error = String;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        if row.city.trim().is_empty() {
            return Err("city is empty".to_string());
        }
        if !row.temperature.is_finite() {
            return Err(format!("temperature {} is not a finite number", row.temperature));
        }
        if row.humidity > 100 {
            return Err(format!("humidity {} is outside 0-100", row.humidity));
        }

        Ok(Self {
            city: row.city,
            timestamp: row.timestamp,
            temperature: row.temperature,
            humidity: row.humidity,
            condition: row.condition,
            raw_source: None,
        })
    }
}

/// True when the file is non-empty and its last byte is not a newline.
fn lacks_trailing_newline(file: &mut File, len: u64) -> std::io::Result<bool> {
    if len == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Append-only CSV log of weather lookups.
#[derive(Debug, Clone)]
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one row, creating the file (and its header) if needed.
    pub fn append(&self, record: &WeatherRecord) -> Result<(), ReporterError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| StorageError::CreateDir(parent.to_path_buf(), e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StorageError::Open(self.path.clone(), e))?;

        let len = file
            .metadata()
            .map_err(|e| StorageError::Open(self.path.clone(), e))?
            .len();
        let is_new = len == 0;

        // A cut-off last row must not swallow the new one.
        let unterminated = lacks_trailing_newline(&mut file, len)
            .map_err(|e| StorageError::Open(self.path.clone(), e))?;
        if unterminated {
            warn!(
                "weather log does not end with a newline, terminating last row: path={}",
                self.path.display()
            );
            file.write_all(b"\n")
                .map_err(|e| StorageError::Write(self.path.clone(), e.into()))?;
        }

        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        let write_err = |e: csv::Error| StorageError::Write(self.path.clone(), e);

        if is_new {
            debug!("creating weather log: path={}", self.path.display());
            wtr.write_record(HEADER).map_err(write_err)?;
        }
        wtr.serialize(LogRow::from(record)).map_err(write_err)?;
        wtr.flush()
            .map_err(|e| StorageError::Write(self.path.clone(), e.into()))?;

        info!("appended lookup to weather log: path={} city={}", self.path.display(), record.city);
        Ok(())
    }

    /// Read every logged lookup back, in file order.
    pub fn records(&self) -> Result<Vec<WeatherRecord>, ReporterError> {
        let len = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Missing(self.path.clone()).into());
            }
            Err(e) => return Err(StorageError::Open(self.path.clone(), e).into()),
        };
        if len == 0 {
            // Left behind by an append whose header write failed.
            debug!("weather log is empty: path={}", self.path.display());
            return Ok(Vec::new());
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| StorageError::Read(self.path.clone(), e))?;

        let headers = rdr
            .headers()
            .map_err(|e| StorageError::Read(self.path.clone(), e))?
            .clone();
        if headers.iter().ne(HEADER) {
            return Err(StorageError::Header {
                path: self.path.clone(),
                found: headers.iter().collect::<Vec<_>>().join(","),
            }
            .into());
        }

        let mut records = Vec::new();
        let mut raw = csv::StringRecord::new();
        loop {
            let more = rdr.read_record(&mut raw).map_err(|e| StorageError::MalformedRow {
                path: self.path.clone(),
                line: e.position().map_or(0, |p| p.line()),
                source: e,
            })?;
            if !more {
                break;
            }

            let line = raw.position().map_or(0, |p| p.line());
            let row: LogRow = raw.deserialize(Some(&headers)).map_err(|e| {
                StorageError::MalformedRow { path: self.path.clone(), line, source: e }
            })?;
            let record = WeatherRecord::try_from(row).map_err(|reason| StorageError::InvalidRow {
                path: self.path.clone(),
                line,
                reason,
            })?;
            records.push(record);
        }

        debug!("read weather log: path={} rows={}", self.path.display(), records.len());
        Ok(records)
    }

    /// Aggregate everything logged so far.
    pub fn summarize(&self) -> Result<Summary, ReporterError> {
        Ok(Summary::from_records(&self.records()?))
    }
}

/// A temperature extreme and where/when it was seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Extreme {
    pub city: String,
    pub temperature: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&WeatherRecord> for Extreme {
    fn from(record: &WeatherRecord) -> Self {
        Self {
            city: record.city.clone(),
            temperature: record.temperature,
            timestamp: record.timestamp,
        }
    }
}

/// Aggregate over the log.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    /// Lookups per distinct city.
    pub cities: BTreeMap<String, usize>,
    pub coldest: Option<Extreme>,
    pub warmest: Option<Extreme>,
    pub mean_temperature: Option<f64>,
}

impl Summary {
    /// Ties keep the earliest row.
    pub fn from_records(records: &[WeatherRecord]) -> Self {
        let mut summary = Summary::default();
        let mut total = 0.0;

        for record in records {
            summary.count += 1;
            *summary.cities.entry(record.city.clone()).or_default() += 1;
            total += record.temperature;

            if summary.coldest.as_ref().is_none_or(|c| record.temperature < c.temperature) {
                summary.coldest = Some(record.into());
            }
            if summary.warmest.as_ref().is_none_or(|w| record.temperature > w.temperature) {
                summary.warmest = Some(record.into());
            }
        }

        if summary.count > 0 {
            summary.mean_temperature = Some(total / summary.count as f64);
        }
        summary
    }

    pub fn distinct_cities(&self) -> usize {
        self.cities.len()
    }
}
