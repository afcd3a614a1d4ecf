use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

/// Weights of the composite score. Carried in the run configuration and
/// passed explicitly to the composite function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessWeights {
    pub sharpe: f64,
    pub drawdown: f64,
    pub consistency: f64,
    pub novelty: f64,
    pub robustness: f64,
    /// Subtracted, scaled by the IS/OOS Sharpe gap.
    pub overfit_penalty: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            sharpe: 1.0,
            drawdown: 0.5,
            consistency: 0.3,
            novelty: 0.4,
            robustness: 0.3,
            overfit_penalty: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoveltyConfig {
    pub k_nearest: usize,
    pub initial_threshold: f64,
    pub min_threshold: f64,
    /// Relative threshold change applied by the dynamic adjustment.
    pub threshold_step: f64,
    /// More insertions than this in one generation raise the threshold.
    pub archive_add_high: usize,
    /// Generations without insertions before the threshold is lowered.
    pub stall_generations: usize,
    /// Archive size from which Mahalanobis distance replaces Euclidean.
    pub mahalanobis_min_archive: usize,
    pub covariance_ridge: f64,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            k_nearest: 10,
            initial_threshold: 0.25,
            min_threshold: 0.01,
            threshold_step: 0.05,
            archive_add_high: 4,
            stall_generations: 3,
            mahalanobis_min_archive: 32,
            covariance_ridge: 1e-6,
        }
    }
}

/// Synthetic return shock applied to the out-of-sample window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShockScenario {
    /// Constant return added to every bar of every asset.
    Drift { per_bar: f64 },
    /// One-bar gap of `magnitude` on every asset at the middle of the window.
    Crash { magnitude: f64 },
    /// Deviations from each asset's mean scaled by `factor`.
    VolatilityScale { factor: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitnessConfig {
    pub weights: FitnessWeights,
    pub novelty: NoveltyConfig,
    pub shocks: Vec<ShockScenario>,
    /// Lowest robustness score a genome with a positive baseline can get.
    pub robustness_floor: f64,
}

impl Default for FitnessConfig {
    fn default() -> Self {
        Self {
            weights: FitnessWeights::default(),
            novelty: NoveltyConfig::default(),
            shocks: vec![
                ShockScenario::Drift { per_bar: -0.001 },
                ShockScenario::Drift { per_bar: -0.0025 },
                ShockScenario::Crash { magnitude: -0.08 },
                ShockScenario::VolatilityScale { factor: 2.0 },
            ],
            robustness_floor: 0.4,
        }
    }
}

impl ConfigSection for FitnessConfig {
    fn section_name() -> &'static str {
        "fitness"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        let w = &self.weights;
        let all = [w.sharpe, w.drawdown, w.consistency, w.novelty, w.robustness, w.overfit_penalty];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(EvoAlphaError::Configuration(
                "Fitness weights must be finite".to_string(),
            ));
        }
        if self.novelty.k_nearest == 0 {
            return Err(EvoAlphaError::Configuration(
                "Novelty k_nearest must be at least 1".to_string(),
            ));
        }
        if self.novelty.initial_threshold < 0.0
            || self.novelty.min_threshold < 0.0
            || !(0.0..1.0).contains(&self.novelty.threshold_step)
        {
            return Err(EvoAlphaError::Configuration(
                "Novelty thresholds must be non-negative and the step in [0, 1)".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.robustness_floor) {
            return Err(EvoAlphaError::Configuration(
                "Robustness floor must be between 0 and 1".to_string(),
            ));
        }
        for shock in &self.shocks {
            if let ShockScenario::VolatilityScale { factor } = shock {
                if *factor < 0.0 {
                    return Err(EvoAlphaError::Configuration(
                        "Volatility shock factor must be non-negative".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}
