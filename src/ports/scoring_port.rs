//! Scoring model and allocation ports.
//!
//! The engine never looks inside a model: it hands candidates to a
//! [`ScoringPort`], passes the scores to an [`AllocationPort`] and consumes
//! the resulting trading list.

use crate::domain::allocation::{Candidate, ScoredCandidate, TradingListEntry};

pub trait ScoringPort {
    /// Confidence for one candidate, or `None` when the model cannot score it.
    fn score(&self, candidate: &Candidate) -> Option<f64>;

    fn score_all(&self, candidates: &[Candidate]) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .map(|c| ScoredCandidate {
                symbol: c.symbol.clone(),
                score: self.score(c),
                features: c.features,
            })
            .collect()
    }
}

pub trait AllocationPort {
    /// Trading list for the day. Proportions must be non-negative and sum to
    /// at most 1; the engine repairs lists that break this.
    fn allocate(&self, scored: &[ScoredCandidate]) -> Vec<TradingListEntry>;
}
