use crate::config::FitnessWeights;
use crate::engines::metrics::BehaviourFingerprint;
use crate::types::PerformanceSummary;
use serde::{Deserialize, Serialize};

/// Weighted composite plus the individual terms it was built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitnessTuple {
    pub composite: f64,
    /// Out-of-sample Sharpe ratio.
    pub sharpe: f64,
    /// `1 - |max drawdown|`.
    pub drawdown: f64,
    pub consistency: f64,
    /// Novelty mapped to [0, 1).
    pub novelty: f64,
    pub robustness: f64,
    /// `|IS sharpe - OOS sharpe|`, subtracted from the composite.
    pub overfit_penalty: f64,
}

impl FitnessTuple {
    /// Builds the tuple from its terms, computing the composite with the
    /// given weights. Non-finite terms count as zero.
    pub fn from_terms(
        sharpe: f64,
        drawdown: f64,
        consistency: f64,
        novelty: f64,
        robustness: f64,
        overfit_penalty: f64,
        weights: &FitnessWeights,
    ) -> Self {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        let mut tuple = Self {
            composite: 0.0,
            sharpe: finite(sharpe),
            drawdown: finite(drawdown),
            consistency: finite(consistency),
            novelty: finite(novelty),
            robustness: finite(robustness),
            overfit_penalty: finite(overfit_penalty),
        };
        tuple.composite = tuple.composite_with(weights);
        tuple
    }

    pub fn composite_with(&self, weights: &FitnessWeights) -> f64 {
        let score = weights.sharpe * self.sharpe
            + weights.drawdown * self.drawdown
            + weights.consistency * self.consistency
            + weights.novelty * self.novelty
            + weights.robustness * self.robustness
            - weights.overfit_penalty * self.overfit_penalty;
        if score.is_finite() {
            score
        } else {
            0.0
        }
    }

    /// Objectives for Pareto ranking, all to be maximised.
    pub fn objectives(&self) -> Vec<f64> {
        vec![
            self.sharpe,
            self.drawdown,
            self.consistency,
            self.novelty,
            self.robustness,
            -self.overfit_penalty,
        ]
    }
}

/// In-sample and out-of-sample statistics of one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub in_sample: PerformanceSummary,
    pub out_of_sample: PerformanceSummary,
    /// Raw mean k-nearest-neighbour distance.
    pub novelty: f64,
    pub diversity: f64,
    pub robustness: f64,
    pub overfit_gap: f64,
    /// Out-of-sample realised capacity.
    pub capacity: f64,
}

/// Fitness, metrics and fingerprint from a single evaluation pass. They are
/// only ever stored or cleared together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub fitness: FitnessTuple,
    pub metrics: EvaluationMetrics,
    pub fingerprint: BehaviourFingerprint,
}
