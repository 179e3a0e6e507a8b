//! Report sink that only emits tracing events. Used where no report files
//! are wanted, such as feature-export runs.

use chrono::NaiveDate;
use tracing::info;

use crate::domain::error::SimError;
use crate::domain::report::{DayReport, RunSummary};
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct LogReportAdapter;

impl LogReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for LogReportAdapter {
    fn begin_day(&mut self, sell_date: NaiveDate, preview: bool) -> Result<(), SimError> {
        if !preview {
            info!(date = %sell_date, "collecting day");
        }
        Ok(())
    }

    fn write_day(&mut self, report: &DayReport) -> Result<(), SimError> {
        match &report.totals {
            Some(t) => info!(
                date = %report.sell_date,
                trades = report.lines.len(),
                daily_gain = t.daily_gain,
                total_gain = t.total_gain,
                "day simulated"
            ),
            None => info!(date = %report.sell_date, picks = report.lines.len(), "would buy"),
        }
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError> {
        for (bucket, gain) in &summary.bucket_gains {
            info!(bucket = %bucket, gain = *gain, "bucket result");
        }
        Ok(())
    }
}
