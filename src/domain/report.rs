//! Report data handed to a [`ReportPort`](crate::ports::report_port::ReportPort).
//!
//! Everything here is computed by the domain; sinks only format it.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::allocation::Side;
use super::ledger::EquityCurve;

/// Portfolio curves this many times larger than every benchmark are drawn on a log axis.
const LOG_SCALE_RATIO: f64 = 5.0;

/// One row of a day's trade table.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeLine {
    pub symbol: String,
    pub proportion: f64,
    pub weight: f64,
    pub side: Side,
    pub today_change: Option<f64>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    /// Signed gain; `None` on a preview day.
    pub gain: Option<f64>,
}

/// Running figures after a day has been recorded in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTotals {
    pub daily_gain: f64,
    pub quarter_gain: f64,
    pub year_gain: f64,
    pub total_gain: f64,
    pub win_trades: usize,
    pub lose_trades: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub sell_date: NaiveDate,
    /// Would-buy preview for a sell date with no price yet.
    pub preview: bool,
    pub lines: Vec<TradeLine>,
    pub totals: Option<DayTotals>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// `(bucket, final gain)` sorted by bucket name.
    pub bucket_gains: Vec<(String, f64)>,
    pub win_trades: usize,
    pub lose_trades: usize,
    pub days: usize,
    pub interrupted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// A bucket's curve with benchmark overlays, all normalized to 1.0 at the
/// bucket's first date.
#[derive(Debug, Clone, PartialEq)]
pub struct EquityChart {
    pub bucket: String,
    pub dates: Vec<NaiveDate>,
    pub portfolio: ChartSeries,
    pub benchmarks: Vec<ChartSeries>,
    pub log_scale: bool,
}

/// Close history of a reference symbol used for chart overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSeries {
    pub symbol: String,
    pub closes: BTreeMap<NaiveDate, f64>,
}

impl BenchmarkSeries {
    /// Closes on `dates` divided by the first one. `None` when any date lacks a close.
    pub fn normalized_over(&self, dates: &[NaiveDate]) -> Option<Vec<f64>> {
        let raw: Vec<f64> = dates
            .iter()
            .map(|d| self.closes.get(d).copied())
            .collect::<Option<_>>()?;
        let base = *raw.first()?;
        if base <= 0.0 {
            return None;
        }
        Some(raw.into_iter().map(|c| c / base).collect())
    }
}

pub fn use_log_scale(portfolio_last: f64, benchmarks: &[ChartSeries]) -> bool {
    let curve_max = benchmarks
        .iter()
        .filter_map(|b| b.values.last())
        .fold(1.0_f64, |acc, v| acc.max(v.abs()));
    portfolio_last.abs() > LOG_SCALE_RATIO * curve_max
}

pub fn build_chart(bucket: &str, curve: &EquityCurve, benchmarks: &[BenchmarkSeries]) -> EquityChart {
    let dates = curve.dates();
    let values = curve.values();
    let overlays: Vec<ChartSeries> = benchmarks
        .iter()
        .filter_map(|b| {
            b.normalized_over(&dates).map(|values| ChartSeries {
                label: format!("{} ({:+.2}%)", b.symbol, (values[values.len() - 1] - 1.0) * 100.0),
                values,
            })
        })
        .collect();
    let log_scale = use_log_scale(curve.last_value(), &overlays);
    EquityChart {
        bucket: bucket.to_string(),
        dates,
        portfolio: ChartSeries {
            label: format!("My Portfolio ({:+.2}%)", curve.gain() * 100.0),
            values,
        },
        benchmarks: overlays,
        log_scale,
    }
}
