//! CSV price-history adapter: one `<SYMBOL>.csv` per symbol.

use crate::domain::error::SimError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const SUFFIX: &str = ".csv";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, SUFFIX))
    }
}

fn field<'r>(record: &'r csv::StringRecord, index: usize, name: &str) -> Result<&'r str, SimError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| SimError::data(format!("missing {} column", name)))
}

fn parse_price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, SimError> {
    field(record, index, name)?
        .parse()
        .map_err(|e| SimError::data(format!("invalid {} value: {}", name, e)))
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SimError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| {
            SimError::data(format!("failed to read {}: {}", path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record =
                result.map_err(|e| SimError::data(format!("CSV parse error: {}", e)))?;

            let date = NaiveDate::parse_from_str(field(&record, 0, "date")?, "%Y-%m-%d")
                .map_err(|e| SimError::data(format!("invalid date format: {}", e)))?;
            if date < start_date || date > end_date {
                continue;
            }

            // volume is often written as a float by exporters
            let volume = field(&record, 5, "volume")?
                .parse::<f64>()
                .map_err(|e| SimError::data(format!("invalid volume value: {}", e)))?
                as i64;

            bars.push(OhlcvBar {
                symbol: symbol.to_string(),
                date,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close: parse_price(&record, 4, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            SimError::data(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| SimError::data(format!("directory entry error: {}", e)))?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(SUFFIX) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
