//! Dataset loading.
//!
//! Reads a tabular source (CSV, or a JSON array of row objects) into a
//! [`Dataset`]. Cells are matched to [`Column`]s by exact header name;
//! unknown columns are ignored and missing ones keep their defaults.
//! Numeric cells that fail to parse become 0.0 and are counted.

use crate::dataset::Dataset;
use crate::error::LoadError;
use crate::models::{Column, MachineStatus, Record};
use csv::{ReaderBuilder, Trim};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options for [`load_dataset`].
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Show a spinner on stderr while reading and parsing.
    pub show_progress: bool,
}

/// Counters collected while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows: usize,
    /// Non-empty numeric cells that could not be parsed and became 0.0.
    pub defaulted_cells: usize,
}

/// Records parsed from one source, with their parse statistics.
#[derive(Debug, Clone, Default)]
pub struct ParsedRows {
    pub records: Vec<Record>,
    pub stats: LoadStats,
}

/// Supported source formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    JsonRows,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::JsonRows),
            _ => Err(LoadError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            }),
        }
    }

    pub fn parse(self, path: &Path, bytes: &[u8]) -> Result<ParsedRows, LoadError> {
        match self {
            SourceFormat::Csv => parse_csv(path, bytes),
            SourceFormat::JsonRows => parse_json_rows(path, bytes),
        }
    }
}

/// Parse a numeric cell. `None` for malformed or non-finite text.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The anomaly flag is set only by a cell holding exactly 1.
pub fn parse_anomaly_flag(raw: &str) -> bool {
    parse_number(raw) == Some(1.0)
}

fn apply_cell(record: &mut Record, column: Column, raw: &str, stats: &mut LoadStats) {
    if column.is_numeric() {
        let value = if raw.trim().is_empty() {
            0.0
        } else {
            parse_number(raw).unwrap_or_else(|| {
                debug!("Non-numeric value '{}' in {}, using 0", raw, column);
                stats.defaulted_cells += 1;
                0.0
            })
        };
        set_number(record, column, value);
        return;
    }

    // Line and machine keys are grouped verbatim, surrounding spaces included.
    let text = raw.trim();
    match column {
        Column::LineName => record.line_name = raw.to_string(),
        Column::MachineId => record.machine_id = raw.to_string(),
        Column::MachineType => record.machine_type = text.to_string(),
        Column::Location => record.location = text.to_string(),
        Column::OperatorName => record.operator_name = text.to_string(),
        Column::Status => record.status = MachineStatus::parse(text),
        Column::MaintenanceStatus => record.maintenance_status = text.to_string(),
        Column::EnergyAnomalyFlag => record.energy_anomaly_flag = parse_anomaly_flag(text),
        _ => {}
    }
}

fn set_number(record: &mut Record, column: Column, value: f64) {
    let field = match column {
        Column::EnergyConsumedKwh => &mut record.energy_consumed_kwh,
        Column::UnitsProduced => &mut record.units_produced,
        Column::EfficiencyScore => &mut record.efficiency_score,
        Column::Co2EmissionKg => &mut record.co2_emission_kg,
        Column::EnergyCostUsd => &mut record.energy_cost_usd,
        Column::MachineTemperature => &mut record.machine_temperature,
        Column::AmbientTemperature => &mut record.ambient_temperature,
        Column::VibrationLevel => &mut record.vibration_level,
        Column::DowntimeMinutes => &mut record.downtime_minutes,
        Column::RatedPowerKw => &mut record.rated_power_kw,
        Column::PowerFactor => &mut record.power_factor,
        _ => return,
    };
    *field = value;
}

/// Starting point for each row; an absent `Status` column reads as N/A.
fn blank_record() -> Record {
    Record {
        status: MachineStatus::Unknown(String::new()),
        ..Record::default()
    }
}

fn warn_unrecognized(headers: &[Option<Column>]) {
    if !headers.is_empty() && headers.iter().all(Option::is_none) {
        warn!("No recognized columns in header row; all records will hold defaults");
    }
}

/// Parse CSV bytes with a header row.
///
/// `path` is only used for error context.
pub fn parse_csv(path: &Path, bytes: &[u8]) -> Result<ParsedRows, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(bytes);

    let columns: Vec<Option<Column>> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(Column::from_header)
        .collect();

    if columns.is_empty() {
        return Err(LoadError::NotTabular {
            path: path.to_path_buf(),
            message: "missing header row".to_string(),
        });
    }
    warn_unrecognized(&columns);

    let mut parsed = ParsedRows::default();
    for row in reader.records() {
        let row = row.map_err(csv_error)?;
        let mut record = blank_record();
        for (column, cell) in columns.iter().zip(row.iter()) {
            if let Some(column) = column {
                apply_cell(&mut record, *column, cell, &mut parsed.stats);
            }
        }
        parsed.records.push(record);
    }

    parsed.stats.rows = parsed.records.len();
    Ok(parsed)
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a JSON array of row objects keyed by column name.
pub fn parse_json_rows(path: &Path, bytes: &[u8]) -> Result<ParsedRows, LoadError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let rows = match value {
        Value::Array(rows) => rows,
        _ => {
            return Err(LoadError::NotTabular {
                path: path.to_path_buf(),
                message: "expected an array of row objects".to_string(),
            })
        }
    };

    let mut parsed = ParsedRows::default();
    for (index, row) in rows.iter().enumerate() {
        let object = row.as_object().ok_or_else(|| LoadError::NotTabular {
            path: path.to_path_buf(),
            message: format!("row {} is not an object", index + 1),
        })?;

        let mut record = blank_record();
        for (key, cell) in object {
            if let Some(column) = Column::from_header(key) {
                apply_cell(&mut record, column, &json_cell(cell), &mut parsed.stats);
            }
        }
        parsed.records.push(record);
    }

    parsed.stats.rows = parsed.records.len();
    Ok(parsed)
}

fn loading_spinner(path: &Path) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(format!("Loading {}", path.display()));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Read and parse a dataset file.
///
/// The file is read asynchronously and parsed on the blocking pool. The
/// returned [`Dataset`] is a complete snapshot; nothing is published until
/// parsing has succeeded.
pub async fn load_dataset(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<Dataset, LoadError> {
    let path: PathBuf = path.as_ref().to_path_buf();
    let format = SourceFormat::from_path(&path)?;

    info!("Loading dataset from: {}", path.display());
    let spinner = options.show_progress.then(|| loading_spinner(&path));

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
    debug!("Read {} bytes", bytes.len());

    let parse_path = path.clone();
    let result = tokio::task::spawn_blocking(move || format.parse(&parse_path, &bytes))
        .await
        .map_err(|e| LoadError::Task(e.to_string()));

    let parsed = match result.and_then(|r| r) {
        Ok(parsed) => parsed,
        Err(e) => {
            if let Some(pb) = spinner {
                pb.abandon_with_message("Load failed");
            }
            return Err(e);
        }
    };

    if let Some(pb) = spinner {
        pb.finish_with_message(format!("Loaded {} records", parsed.stats.rows));
    }

    info!(
        "Loaded {} records from {}",
        parsed.stats.rows,
        path.display()
    );
    if parsed.stats.defaulted_cells > 0 {
        warn!(
            "{} numeric cells could not be parsed and were read as 0",
            parsed.stats.defaulted_cells
        );
    }

    Ok(Dataset::new(parsed.records, path.display().to_string()))
}
