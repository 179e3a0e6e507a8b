//! Built-in scoring models.

use crate::domain::allocation::Candidate;
use crate::domain::error::SimError;
use crate::domain::features::FEATURE_COLUMNS;
use crate::ports::config_port::ConfigPort;
use crate::ports::scoring_port::ScoringPort;

/// Scores a candidate by its one-month change. Used when no model file is given.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MomentumScorer;

impl ScoringPort for MomentumScorer {
    fn score(&self, candidate: &Candidate) -> Option<f64> {
        candidate.features.map(|f| f.month_change)
    }
}

/// `bias + Σ weight_i * feature_i` over the named feature columns.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModelScorer {
    pub bias: f64,
    pub weights: [f64; 6],
}

impl LinearModelScorer {
    /// Reads `[model] bias` and `[weights] <Feature_Column> = w` from a model
    /// file. Features without a weight contribute nothing.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SimError> {
        let bias = match config.get_string("model", "bias") {
            Some(raw) => parse_weight("model", "bias", &raw)?,
            None => 0.0,
        };
        let mut weights = [0.0; 6];
        let mut any = false;
        for (slot, column) in weights.iter_mut().zip(FEATURE_COLUMNS) {
            if let Some(raw) = config.get_string("weights", column) {
                *slot = parse_weight("weights", column, &raw)?;
                any = true;
            }
        }
        if !any {
            return Err(SimError::ConfigMissing {
                section: "weights".into(),
                key: FEATURE_COLUMNS.join("|"),
            });
        }
        Ok(Self { bias, weights })
    }
}

fn parse_weight(section: &str, key: &str, raw: &str) -> Result<f64, SimError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .ok_or_else(|| SimError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("'{raw}' is not a number"),
        })
}

impl ScoringPort for LinearModelScorer {
    fn score(&self, candidate: &Candidate) -> Option<f64> {
        let features = candidate.features?;
        let dot: f64 = features
            .values()
            .iter()
            .zip(self.weights.iter())
            .map(|(f, w)| f * w)
            .sum();
        Some(self.bias + dot)
    }
}
