#![allow(dead_code)]

use chrono::NaiveDate;
use dailysim::domain::date_axis::next_business_day;
use dailysim::domain::error::SimError;
pub use dailysim::domain::ohlcv::OhlcvBar;
use dailysim::domain::report::{DayReport, EquityChart, RunSummary};
use dailysim::ports::data_port::DataPort;
use dailysim::ports::report_port::ReportPort;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SimError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SimError::data(reason.clone()));
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, SimError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.extend(self.errors.keys().cloned());
        symbols.sort();
        Ok(symbols)
    }
}

/// Report sink that keeps everything it is given.
#[derive(Default)]
pub struct CollectingReport {
    pub days: Vec<DayReport>,
    pub summaries: Vec<RunSummary>,
    pub charts: Vec<EquityChart>,
}

impl ReportPort for CollectingReport {
    fn write_day(&mut self, report: &DayReport) -> Result<(), SimError> {
        self.days.push(report.clone());
        Ok(())
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError> {
        self.summaries.push(summary.clone());
        Ok(())
    }

    fn write_chart(&mut self, chart: &EquityChart) -> Result<(), SimError> {
        self.charts.push(chart.clone());
        Ok(())
    }
}

/// Raises `flag` once `after` days have been started, in either run mode.
pub struct InterruptingReport<'a> {
    pub inner: CollectingReport,
    pub flag: &'a AtomicBool,
    pub after: usize,
    pub started: usize,
}

impl<'a> InterruptingReport<'a> {
    pub fn new(flag: &'a AtomicBool, after: usize) -> Self {
        Self {
            inner: CollectingReport::default(),
            flag,
            after,
            started: 0,
        }
    }
}

impl ReportPort for InterruptingReport<'_> {
    fn begin_day(&mut self, _sell_date: NaiveDate, _preview: bool) -> Result<(), SimError> {
        self.started += 1;
        if self.started >= self.after {
            self.flag.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    fn write_day(&mut self, report: &DayReport) -> Result<(), SimError> {
        self.inner.write_day(report)
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError> {
        self.inner.write_summary(summary)
    }
}

/// Report sink whose day writes always fail.
pub struct FailingReport {
    pub summaries: Vec<RunSummary>,
}

impl ReportPort for FailingReport {
    fn write_day(&mut self, _report: &DayReport) -> Result<(), SimError> {
        Err(SimError::Io(std::io::Error::other("disk full")))
    }

    fn write_summary(&mut self, summary: &RunSummary) -> Result<(), SimError> {
        self.summaries.push(summary.clone());
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(symbol: &str, date: NaiveDate, close: f64) -> OhlcvBar {
    OhlcvBar {
        symbol: symbol.to_string(),
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per business day from `start`, carrying the given closes.
pub fn bars_from_closes(symbol: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    let mut date = start;
    closes
        .iter()
        .map(|&close| {
            let bar = make_bar(symbol, date, close);
            date = next_business_day(date);
            bar
        })
        .collect()
}

/// `count` business-day bars rising by `step` from `start_price`.
pub fn generate_bars(
    symbol: &str,
    start: NaiveDate,
    count: usize,
    start_price: f64,
    step: f64,
) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64 * step).collect();
    bars_from_closes(symbol, start, &closes)
}
