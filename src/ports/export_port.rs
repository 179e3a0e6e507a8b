//! Feature/label export port trait.

use std::path::PathBuf;

use crate::domain::error::SimError;
use crate::domain::trade_record::TradeRecord;

pub trait ExportPort {
    /// Persists `records` under `file_name` and returns where they went.
    fn write_records(&self, file_name: &str, records: &[TradeRecord]) -> Result<PathBuf, SimError>;
}
