use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

/// Elite Gate thresholds. Run-level configuration, never adapted during a run.
/// Acceptance requires every `min_*` bar to be strictly exceeded and the
/// drawdown to stay at or below `max_drawdown`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub min_oos_sharpe: f64,
    pub min_persistence: f64,
    pub min_consistency: f64,
    pub min_diversity: f64,
    pub max_drawdown: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_oos_sharpe: 3.5,
            min_persistence: 0.85,
            min_consistency: 0.5,
            min_diversity: 0.6,
            max_drawdown: 0.25,
        }
    }
}

impl GateConfig {
    /// Thresholds every evaluated genome passes.
    pub fn always_pass() -> Self {
        Self {
            min_oos_sharpe: f64::NEG_INFINITY,
            min_persistence: f64::NEG_INFINITY,
            min_consistency: f64::NEG_INFINITY,
            min_diversity: f64::NEG_INFINITY,
            max_drawdown: f64::INFINITY,
        }
    }
}

impl ConfigSection for GateConfig {
    fn section_name() -> &'static str {
        "gate"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        let bars = [
            self.min_oos_sharpe,
            self.min_persistence,
            self.min_consistency,
            self.min_diversity,
            self.max_drawdown,
        ];
        if bars.iter().any(|v| v.is_nan()) {
            return Err(EvoAlphaError::Configuration(
                "Gate thresholds must not be NaN".to_string(),
            ));
        }
        if self.max_drawdown < 0.0 {
            return Err(EvoAlphaError::Configuration(
                "Maximum drawdown must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
