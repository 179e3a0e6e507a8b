//! Candidates, trading lists and realized-gain sign conventions.

use std::fmt;

use super::features::MlFeatures;
use crate::ports::scoring_port::AllocationPort;

/// Realized gains at or above this magnitude are treated as corporate-action
/// artifacts (splits) and dropped from every aggregate.
pub const GAIN_OUTLIER_THRESHOLD: f64 = 1.0;

pub fn is_outlier_gain(gain: f64) -> bool {
    !gain.is_finite() || gain.abs() >= GAIN_OUTLIER_THRESHOLD
}

/// Next-day gain of buying at `buy` and selling at `sell`.
pub fn next_day_gain(buy: f64, sell: f64) -> f64 {
    (sell - buy) / buy
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// Gain of a position on this side given the underlying's raw gain.
    pub fn signed_gain(self, raw_gain: f64) -> f64 {
        match self {
            Side::Long => raw_gain,
            Side::Short => -raw_gain,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "long"),
            Side::Short => write!(f, "short"),
        }
    }
}

/// A symbol tradable on one day, as seen by the scoring model.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub features: Option<MlFeatures>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub symbol: String,
    pub score: Option<f64>,
    pub features: Option<MlFeatures>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradingListEntry {
    pub symbol: String,
    pub proportion: f64,
    pub weight: f64,
    pub side: Side,
}

/// Enforces the allocator contract: proportions are clamped into `[0, 1]`
/// and scaled down together when they sum above 1.
///
/// Returns `true` when the list had to be repaired.
pub fn normalize_trading_list(entries: &mut [TradingListEntry]) -> bool {
    let mut repaired = false;
    for e in entries.iter_mut() {
        if !e.proportion.is_finite() || e.proportion < 0.0 {
            e.proportion = 0.0;
            repaired = true;
        }
    }
    let total: f64 = entries.iter().map(|e| e.proportion).sum();
    if total > 1.0 + 1e-9 {
        for e in entries.iter_mut() {
            e.proportion /= total;
        }
        repaired = true;
    }
    repaired
}

/// Default allocator: ranks scored candidates by |score| and spreads capital
/// over the best `max_positions` in proportion to their scores.
#[derive(Debug, Clone, PartialEq)]
pub struct RankAllocator {
    pub max_positions: usize,
    pub allow_short: bool,
    pub min_score: f64,
}

impl Default for RankAllocator {
    fn default() -> Self {
        RankAllocator {
            max_positions: 5,
            allow_short: false,
            min_score: 0.0,
        }
    }
}

impl AllocationPort for RankAllocator {
    fn allocate(&self, scored: &[ScoredCandidate]) -> Vec<TradingListEntry> {
        let mut picks: Vec<(&str, f64)> = scored
            .iter()
            .filter_map(|c| c.score.map(|s| (c.symbol.as_str(), s)))
            .filter(|(_, s)| s.is_finite())
            .filter(|(_, s)| *s > self.min_score || (self.allow_short && *s < -self.min_score))
            .collect();
        picks.sort_by(|a, b| {
            b.1.abs()
                .total_cmp(&a.1.abs())
                .then_with(|| a.0.cmp(b.0))
        });
        picks.truncate(self.max_positions);

        let total: f64 = picks.iter().map(|(_, s)| s.abs()).sum();
        if total <= 0.0 {
            return Vec::new();
        }
        picks
            .into_iter()
            .map(|(symbol, score)| TradingListEntry {
                symbol: symbol.to_string(),
                proportion: score.abs() / total,
                weight: score,
                side: if score >= 0.0 { Side::Long } else { Side::Short },
            })
            .collect()
    }
}
