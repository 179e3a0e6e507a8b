//! Feature-row CSV files: written by export runs, read back by replay runs.
//!
//! Layout: `Symbol,Date,<feature columns>,Gain`, one row per symbol and sell
//! date. The header is validated when a file is loaded.

use crate::domain::error::SimError;
use crate::domain::features::{MlFeatures, FEATURE_COLUMNS};
use crate::domain::trade_record::TradeRecord;
use crate::ports::export_port::ExportPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const SYMBOL_COLUMN: &str = "Symbol";
const DATE_COLUMN: &str = "Date";
const GAIN_COLUMN: &str = "Gain";

pub struct FeatureCsvAdapter {
    export_dir: PathBuf,
}

impl FeatureCsvAdapter {
    pub fn new(export_dir: PathBuf) -> Self {
        Self { export_dir }
    }

    /// Reads every file in order and concatenates their rows.
    pub fn read_files(paths: &[PathBuf]) -> Result<Vec<TradeRecord>, SimError> {
        let mut records = Vec::new();
        for path in paths {
            let before = records.len();
            read_file(path, &mut records)?;
            info!(path = %path.display(), rows = records.len() - before, "loaded feature rows");
        }
        Ok(records)
    }
}

pub fn header() -> Vec<&'static str> {
    let mut columns = vec![SYMBOL_COLUMN, DATE_COLUMN];
    columns.extend(FEATURE_COLUMNS);
    columns.push(GAIN_COLUMN);
    columns
}

fn schema_error(path: &Path, reason: impl Into<String>) -> SimError {
    SimError::ReplaySchema {
        file: path.display().to_string(),
        reason: reason.into(),
    }
}

/// Maps every expected column to its position. Unknown named columns are
/// rejected; an unnamed leading index column is tolerated.
fn column_index<'h>(
    path: &Path,
    headers: &'h csv::StringRecord,
) -> Result<HashMap<&'h str, usize>, SimError> {
    let expected = header();
    let mut columns = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        let name = name.trim();
        if name.is_empty() && i == 0 {
            continue;
        }
        if !expected.iter().any(|c| *c == name) {
            return Err(schema_error(path, format!("unknown column '{}'", name)));
        }
        if columns.insert(name, i).is_some() {
            return Err(schema_error(path, format!("duplicate column '{}'", name)));
        }
    }
    if let Some(missing) = expected.iter().find(|c| !columns.contains_key(*c)) {
        return Err(schema_error(path, format!("missing column '{}'", missing)));
    }
    Ok(columns)
}

fn read_file(path: &Path, out: &mut Vec<TradeRecord>) -> Result<(), SimError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let columns = column_index(path, &headers)?;
    let cell = |record: &csv::StringRecord, name: &str| -> String {
        columns
            .get(name)
            .and_then(|i| record.get(*i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    for (line, result) in rdr.records().enumerate() {
        let record = result?;
        let row = line + 2;

        let symbol = cell(&record, SYMBOL_COLUMN);
        if symbol.is_empty() {
            return Err(schema_error(path, format!("row {}: empty Symbol", row)));
        }
        let raw_date = cell(&record, DATE_COLUMN);
        // tolerate a trailing time component
        let date = raw_date
            .get(..10)
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .ok_or_else(|| schema_error(path, format!("row {}: invalid Date '{}'", row, raw_date)))?;
        let features = MlFeatures::from_row(&columns, &record)
            .map_err(|reason| schema_error(path, format!("row {}: {}", row, reason)))?;
        let raw_gain = cell(&record, GAIN_COLUMN);
        let gain = raw_gain
            .parse::<f64>()
            .map_err(|_| schema_error(path, format!("row {}: invalid Gain '{}'", row, raw_gain)))?;

        out.push(TradeRecord {
            symbol,
            date,
            features,
            gain,
        });
    }
    Ok(())
}

impl ExportPort for FeatureCsvAdapter {
    fn write_records(&self, file_name: &str, records: &[TradeRecord]) -> Result<PathBuf, SimError> {
        fs::create_dir_all(&self.export_dir)?;
        let path = self.export_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header())?;
        for record in records {
            let mut row = vec![record.symbol.clone(), record.date.format("%Y-%m-%d").to_string()];
            row.extend(record.features.values().iter().map(f64::to_string));
            row.push(record.gain.to_string());
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}
