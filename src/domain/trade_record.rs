//! Labeled feature row produced by export runs and consumed by replay runs.

use chrono::NaiveDate;

use super::features::MlFeatures;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    /// Sell date; the features describe the session before it.
    pub date: NaiveDate,
    pub features: MlFeatures,
    /// Raw next-day gain of the underlying.
    pub gain: f64,
}
