//! Report sink port trait.

use chrono::NaiveDate;

use crate::domain::error::SimError;
use crate::domain::report::{DayReport, EquityChart, RunSummary};

/// Receives fully computed report data; implementations only render it.
pub trait ReportPort {
    /// Called before each day is processed, in both run modes.
    fn begin_day(&mut self, sell_date: NaiveDate, preview: bool) -> Result<(), SimError> {
        let _ = (sell_date, preview);
        Ok(())
    }

    fn write_day(&mut self, report: &DayReport) -> Result<(), SimError>;

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError>;

    /// Default implementation: charts are optional for text-only sinks.
    fn write_chart(&mut self, chart: &EquityChart) -> Result<(), SimError> {
        let _ = chart;
        Ok(())
    }
}
