//! Named ML features derived from a close-price series at a cutoff.
//!
//! The same record is produced by computed mode (from aligned closes) and
//! loaded by replay mode (from exported CSV rows), so the column names here
//! are the on-disk schema of feature files.

use std::collections::HashMap;

/// Sessions in a trading year; the longest look-back any feature needs.
pub const DAYS_IN_A_YEAR: usize = 252;
const WEEK: usize = 5;
const MONTH: usize = 20;

pub const FEATURE_COLUMNS: [&str; 6] = [
    "Today_Change",
    "Week_Change",
    "Month_Change",
    "Year_Change",
    "Volatility",
    "Year_High_Ratio",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MlFeatures {
    pub today_change: f64,
    pub week_change: f64,
    pub month_change: f64,
    pub year_change: f64,
    /// Standard deviation of the last month's daily returns.
    pub volatility: f64,
    /// Close at cutoff over the highest close of the trailing year.
    pub year_high_ratio: f64,
}

impl MlFeatures {
    pub const LOOKBACK: usize = DAYS_IN_A_YEAR;

    /// Values in [`FEATURE_COLUMNS`] order.
    pub fn values(&self) -> [f64; 6] {
        [
            self.today_change,
            self.week_change,
            self.month_change,
            self.year_change,
            self.volatility,
            self.year_high_ratio,
        ]
    }

    pub fn from_values(v: [f64; 6]) -> Self {
        Self {
            today_change: v[0],
            week_change: v[1],
            month_change: v[2],
            year_change: v[3],
            volatility: v[4],
            year_high_ratio: v[5],
        }
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|i| self.values()[i])
    }

    /// Computes features from `closes[..=cutoff]`.
    ///
    /// Returns `None` when the series is too short or any anchor close
    /// (cutoff, 1/5/20/252 sessions back) is missing.
    pub fn compute(closes: &[Option<f64>], cutoff: usize) -> Option<Self> {
        if cutoff >= closes.len() || cutoff < Self::LOOKBACK {
            return None;
        }
        let close = closes[cutoff]?;
        let change_since = |back: usize| closes[cutoff - back].map(|prev| close / prev - 1.0);

        let today_change = change_since(1)?;
        let week_change = change_since(WEEK)?;
        let month_change = change_since(MONTH)?;
        let year_change = change_since(DAYS_IN_A_YEAR)?;

        let returns: Vec<f64> = (cutoff - MONTH + 1..=cutoff)
            .filter_map(|i| match (closes[i - 1], closes[i]) {
                (Some(a), Some(b)) => Some(b / a - 1.0),
                _ => None,
            })
            .collect();
        if returns.len() < 2 {
            return None;
        }
        let volatility = stddev(&returns);

        let year_high = closes[cutoff - DAYS_IN_A_YEAR + 1..=cutoff]
            .iter()
            .flatten()
            .fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Some(Self {
            today_change,
            week_change,
            month_change,
            year_change,
            volatility,
            year_high_ratio: close / year_high,
        })
    }

    /// Reads the feature columns out of a header-indexed CSV row.
    pub fn from_row(
        columns: &HashMap<&str, usize>,
        record: &csv::StringRecord,
    ) -> Result<Self, String> {
        let mut values = [0.0; 6];
        for (slot, name) in values.iter_mut().zip(FEATURE_COLUMNS) {
            let idx = columns
                .get(name)
                .ok_or_else(|| format!("missing column {name}"))?;
            let raw = record.get(*idx).unwrap_or("");
            *slot = raw
                .trim()
                .parse()
                .map_err(|_| format!("invalid {name} value '{raw}'"))?;
        }
        Ok(Self::from_values(values))
    }
}

fn stddev(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    var.sqrt()
}
