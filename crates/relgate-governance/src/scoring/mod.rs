//! Evidence-driven risk scoring.
//!
//! Maps an evidence payload and the active model version's factors to a
//! 0-100 risk score with a per-factor breakdown. Scoring is a pure function
//! of its inputs: no side effects, no errors - any per-factor evaluation
//! failure degrades to the neutral score for that factor alone.

mod evaluators;

pub use evaluators::{evaluator_for, FactorEvaluator};

use serde::{Deserialize, Serialize};

use crate::model::RiskFactor;
use crate::types::RiskFactorType;

/// The contribution of a single factor to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    /// Which evaluator produced this score.
    pub factor_type: RiskFactorType,
    /// Configured factor name.
    pub name: String,
    /// Configured weight.
    pub weight: f64,
    /// Raw per-factor score before weighting (0-100).
    pub raw_score: f64,
    /// Weighted contribution to the aggregate.
    pub weighted_score: f64,
}

impl FactorScore {
    /// Create a new factor score.
    pub fn new(
        factor_type: RiskFactorType,
        name: impl Into<String>,
        weight: f64,
        raw_score: f64,
    ) -> Self {
        Self {
            factor_type,
            name: name.into(),
            weight,
            raw_score,
            weighted_score: weight * raw_score,
        }
    }
}

/// A computed risk score with its factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Aggregate risk score in `[0, 100]`.
    pub score: f64,
    /// Per-factor contributions.
    pub breakdown: Vec<FactorScore>,
}

/// The pure scoring engine.
pub struct RiskScoringEngine;

impl RiskScoringEngine {
    /// Score used when evidence is missing, a rubric does not match, or no
    /// factors are configured.
    pub const NEUTRAL_SCORE: f64 = 50.0;

    /// Compute the risk score for an evidence payload against a set of
    /// factors.
    ///
    /// The aggregate is the weighted average
    /// `clamp(0, 100, sum(w_i * s_i) / sum(w_i))` - factor scores are already
    /// on a 0-100 scale, so the average is never rescaled. With no factors
    /// configured the result is the neutral score with an empty breakdown.
    #[must_use]
    pub fn compute_risk_score(
        evidence_data: &serde_json::Value,
        factors: &[RiskFactor],
    ) -> RiskAssessment {
        if factors.is_empty() {
            return RiskAssessment {
                score: Self::NEUTRAL_SCORE,
                breakdown: Vec::new(),
            };
        }

        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        let mut breakdown = Vec::with_capacity(factors.len());

        for factor in factors {
            let evaluate = evaluator_for(factor.factor_type);
            let raw_score = evaluate(evidence_data, &factor.rubric);

            weighted_sum += factor.weight * raw_score;
            weight_total += factor.weight;
            breakdown.push(FactorScore::new(
                factor.factor_type,
                factor.name.clone(),
                factor.weight,
                raw_score,
            ));
        }

        let score = if weight_total > 0.0 {
            (weighted_sum / weight_total).clamp(0.0, 100.0)
        } else {
            Self::NEUTRAL_SCORE
        };

        RiskAssessment { score, breakdown }
    }
}
