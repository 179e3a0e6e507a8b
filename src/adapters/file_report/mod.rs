//! File-based report sink.
//!
//! Each run gets its own directory `<output_root>/<%Y-%m-%d-%H-%M>/` holding
//! `result.txt` (day sections and the summary) and one `<bucket>.svg` chart
//! per equity bucket.

pub mod chart_svg;
pub mod tables;

use chrono::NaiveDateTime;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::error::SimError;
use crate::domain::report::{DayReport, EquityChart, RunSummary};
use crate::ports::report_port::ReportPort;

pub const RESULT_FILE: &str = "result.txt";

pub struct FileReportAdapter {
    output_dir: PathBuf,
    writer: BufWriter<File>,
}

impl FileReportAdapter {
    /// Creates the timestamped run directory under `output_root`.
    pub fn create(output_root: &Path, started_at: NaiveDateTime) -> Result<Self, SimError> {
        let output_dir = output_root.join(started_at.format("%Y-%m-%d-%H-%M").to_string());
        Self::in_dir(output_dir)
    }

    /// Writes straight into `output_dir`, creating it if needed.
    pub fn in_dir(output_dir: PathBuf) -> Result<Self, SimError> {
        fs::create_dir_all(&output_dir)?;
        let file = File::create(output_dir.join(RESULT_FILE))?;
        Ok(Self {
            output_dir,
            writer: BufWriter::new(file),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn append(&mut self, text: &str) -> Result<(), SimError> {
        self.writer.write_all(text.as_bytes())?;
        // keep partial output on disk if the process dies mid-run
        self.writer.flush()?;
        Ok(())
    }
}

impl ReportPort for FileReportAdapter {
    fn write_day(&mut self, report: &DayReport) -> Result<(), SimError> {
        self.append(&tables::render_day(report))
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError> {
        self.append(&tables::render_summary(summary))
    }

    fn write_chart(&mut self, chart: &EquityChart) -> Result<(), SimError> {
        let svg = chart_svg::generate_equity_svg(chart);
        if svg.is_empty() {
            return Ok(());
        }
        fs::write(self.output_dir.join(format!("{}.svg", chart.bucket)), svg)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::report::ChartSeries;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn create_uses_timestamped_directory() {
        let dir = TempDir::new().unwrap();
        let started = d(2021, 3, 4).and_hms_opt(9, 7, 0).unwrap();
        let adapter = FileReportAdapter::create(dir.path(), started).unwrap();
        assert_eq!(adapter.output_dir(), dir.path().join("2021-03-04-09-07"));
        assert!(adapter.output_dir().join(RESULT_FILE).exists());
    }

    #[test]
    fn days_and_summary_are_appended_in_order() {
        let dir = TempDir::new().unwrap();
        let mut adapter = FileReportAdapter::in_dir(dir.path().join("run")).unwrap();
        adapter
            .write_day(&DayReport {
                sell_date: d(2021, 1, 5),
                preview: false,
                lines: vec![],
                totals: None,
            })
            .unwrap();
        adapter
            .write_summary(&RunSummary {
                start_date: d(2021, 1, 5),
                end_date: d(2021, 1, 5),
                bucket_gains: vec![("Total".into(), 0.0)],
                win_trades: 0,
                lose_trades: 0,
                days: 1,
                interrupted: false,
            })
            .unwrap();

        let content = fs::read_to_string(dir.path().join("run").join(RESULT_FILE)).unwrap();
        let day = content.find("2021-01-05 ====").unwrap();
        let summary = content.find("Summary").unwrap();
        assert!(day < summary);
    }

    #[test]
    fn chart_is_written_per_bucket() {
        let dir = TempDir::new().unwrap();
        let mut adapter = FileReportAdapter::in_dir(dir.path().to_path_buf()).unwrap();
        let chart = EquityChart {
            bucket: "2021-Q1".into(),
            dates: vec![d(2021, 1, 4), d(2021, 1, 5)],
            portfolio: ChartSeries {
                label: "My Portfolio (+1.00%)".into(),
                values: vec![1.0, 1.01],
            },
            benchmarks: vec![],
            log_scale: false,
        };
        adapter.write_chart(&chart).unwrap();
        let svg = fs::read_to_string(dir.path().join("2021-Q1.svg")).unwrap();
        assert!(svg.contains("<svg"));
    }
}
