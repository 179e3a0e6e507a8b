//! In-memory price table (computed mode) and feature-row table (replay mode).
//!
//! Both stores expose the same view of a simulated day, a [`TradingDay`], so
//! the engine's day transition does not care where the data came from.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use super::allocation::next_day_gain;
use super::date_axis::{next_business_day, DateAxis};
use super::error::SimError;
use super::features::MlFeatures;
use super::ohlcv::OhlcvBar;
use super::trade_record::TradeRecord;

/// Per-symbol closes aligned to a shared axis; `None` marks a non-tradable day.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    axis: DateAxis,
    closes: BTreeMap<String, Vec<Option<f64>>>,
}

impl PriceTable {
    /// Aligns provider bars on the union of all their dates.
    pub fn from_bars(history: Vec<(String, Vec<OhlcvBar>)>) -> Self {
        let unique_dates: BTreeSet<NaiveDate> = history
            .iter()
            .flat_map(|(_, bars)| bars.iter().map(|bar| bar.date))
            .collect();
        let axis = DateAxis::from_unsorted(unique_dates.into_iter().collect());

        let closes = history
            .into_iter()
            .map(|(symbol, bars)| {
                let mut series = vec![None; axis.len()];
                for bar in bars.iter().filter(|b| b.has_valid_close()) {
                    if let Some(i) = axis.index_of(bar.date) {
                        series[i] = Some(bar.close);
                    }
                }
                (symbol, series)
            })
            .collect();
        Self { axis, closes }
    }

    pub fn axis(&self) -> &DateAxis {
        &self.axis
    }

    pub fn close(&self, symbol: &str, index: usize) -> Option<f64> {
        self.closes.get(symbol)?.get(index).copied().flatten()
    }

    fn trading_day(&self, cutoff: usize, sell_date: NaiveDate, preview: bool) -> TradingDay {
        let candidates = self
            .closes
            .iter()
            .filter_map(|(symbol, series)| {
                let buy = series.get(cutoff).copied().flatten()?;
                let sell = if preview {
                    None
                } else {
                    series.get(cutoff + 1).copied().flatten()
                };
                let today_change = cutoff
                    .checked_sub(1)
                    .and_then(|prev| series[prev])
                    .map(|prev| buy / prev - 1.0);
                Some(DayCandidate {
                    symbol: symbol.clone(),
                    features: MlFeatures::compute(series, cutoff),
                    today_change,
                    buy_price: Some(buy),
                    sell_price: sell,
                    gain: sell.map(|s| next_day_gain(buy, s)),
                })
            })
            .collect();
        TradingDay {
            sell_date,
            preview,
            candidates,
        }
    }
}

/// Exported feature rows grouped by sell date.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayTable {
    axis: DateAxis,
    rows: BTreeMap<NaiveDate, Vec<TradeRecord>>,
}

impl ReplayTable {
    pub fn from_records(records: Vec<TradeRecord>) -> Self {
        let mut rows: BTreeMap<NaiveDate, Vec<TradeRecord>> = BTreeMap::new();
        for record in records {
            rows.entry(record.date).or_default().push(record);
        }
        let axis = DateAxis::from_unsorted(rows.keys().copied().collect());
        Self { axis, rows }
    }

    pub fn axis(&self) -> &DateAxis {
        &self.axis
    }

    pub fn rows(&self, date: NaiveDate) -> &[TradeRecord] {
        self.rows.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    fn trading_day(&self, date: NaiveDate) -> TradingDay {
        let candidates = self
            .rows(date)
            .iter()
            .map(|row| DayCandidate {
                symbol: row.symbol.clone(),
                features: Some(row.features),
                today_change: Some(row.features.today_change),
                buy_price: None,
                sell_price: None,
                gain: Some(row.gain),
            })
            .collect();
        TradingDay {
            sell_date: date,
            preview: false,
            candidates,
        }
    }
}

/// A symbol tradable on a simulated day with everything known about it.
#[derive(Debug, Clone, PartialEq)]
pub struct DayCandidate {
    pub symbol: String,
    pub features: Option<MlFeatures>,
    pub today_change: Option<f64>,
    pub buy_price: Option<f64>,
    pub sell_price: Option<f64>,
    /// Raw next-day gain of the underlying; `None` without a sell price.
    pub gain: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingDay {
    pub sell_date: NaiveDate,
    pub preview: bool,
    pub candidates: Vec<DayCandidate>,
}

impl TradingDay {
    pub fn candidate(&self, symbol: &str) -> Option<&DayCandidate> {
        self.candidates.iter().find(|c| c.symbol == symbol)
    }
}

/// A scheduled step of the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayRef {
    /// Buy at `cutoff`, sell on `sell_date`. `preview` marks the trailing
    /// day past the end of history.
    Cutoff {
        cutoff: usize,
        sell_date: NaiveDate,
        preview: bool,
    },
    /// All replay rows of one sell date.
    Batch { date: NaiveDate },
}

impl DayRef {
    pub fn sell_date(&self) -> NaiveDate {
        match *self {
            DayRef::Cutoff { sell_date, .. } => sell_date,
            DayRef::Batch { date } => date,
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, DayRef::Cutoff { preview: true, .. })
    }
}

/// Resolved date range plus the ordered days the engine will walk.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DayRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesStore {
    Computed(PriceTable),
    Replay(ReplayTable),
}

impl SeriesStore {
    pub fn axis(&self) -> &DateAxis {
        match self {
            SeriesStore::Computed(t) => t.axis(),
            SeriesStore::Replay(t) => t.axis(),
        }
    }

    /// Resolves the simulation window. Missing dates default to the full
    /// available history; computed mode starts no earlier than `lookback + 1`.
    pub fn plan_window(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        lookback: usize,
    ) -> Result<SimulationWindow, SimError> {
        let axis = self.axis();
        let (first, last) = match (axis.first(), axis.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Err(SimError::NoData),
        };

        match self {
            SeriesStore::Computed(_) => {
                let start_date = match start {
                    Some(s) => s,
                    None => axis.get(lookback + 1).ok_or_else(|| SimError::InsufficientHistory {
                        start: first.to_string(),
                        lookback,
                        available: axis.len().saturating_sub(1),
                    })?,
                };
                let end_date = end.unwrap_or(last);
                let (start_point, end_point) = axis.resolve_window(start_date, end_date, lookback)?;

                let mut days: Vec<DayRef> = (start_point - 1..end_point)
                    .filter_map(|cutoff| {
                        axis.get(cutoff + 1).map(|sell_date| DayRef::Cutoff {
                            cutoff,
                            sell_date,
                            preview: false,
                        })
                    })
                    .collect();
                if end_date > last {
                    days.push(DayRef::Cutoff {
                        cutoff: axis.len() - 1,
                        sell_date: next_business_day(last),
                        preview: true,
                    });
                }
                Ok(SimulationWindow {
                    start_date,
                    end_date,
                    days,
                })
            }
            SeriesStore::Replay(_) => {
                let start_date = start.unwrap_or(first);
                let end_date = end.unwrap_or(last);
                let days = axis
                    .dates()
                    .iter()
                    .filter(|d| **d >= start_date && **d <= end_date)
                    .map(|&date| DayRef::Batch { date })
                    .collect();
                Ok(SimulationWindow {
                    start_date,
                    end_date,
                    days,
                })
            }
        }
    }

    /// Materializes the candidates of one scheduled day.
    pub fn trading_day(&self, day: DayRef) -> TradingDay {
        match (self, day) {
            (
                SeriesStore::Computed(t),
                DayRef::Cutoff {
                    cutoff,
                    sell_date,
                    preview,
                },
            ) => t.trading_day(cutoff, sell_date, preview),
            (SeriesStore::Replay(t), DayRef::Batch { date }) => t.trading_day(date),
            (_, other) => TradingDay {
                sell_date: other.sell_date(),
                preview: other.is_preview(),
                candidates: Vec::new(),
            },
        }
    }
}
