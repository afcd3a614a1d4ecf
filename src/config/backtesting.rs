use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestingConfig {
    /// Rows requested from the data provider; 0 means all available rows.
    pub lookback_bars: usize,
    /// In-sample share of the table. `None` picks 0.7 above 1000 rows, else 0.6.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub train_ratio: Option<f64>,
    pub fold_count: usize,
    pub min_fold_bars: usize,
    pub annualization: f64,
    /// Largest position change executable in a single bar.
    pub capacity_limit: f64,
    pub base_cost_bps: f64,
    pub liquidity_cost_bps: f64,
    pub impact_cost_bps: f64,
    /// Trade size treated as one full unit of bar liquidity.
    pub liquidity_reference: f64,
    /// Bars per block for the persistence statistic (21 ~ one month).
    pub persistence_block: usize,
}

impl Default for BacktestingConfig {
    fn default() -> Self {
        Self {
            lookback_bars: 0,
            train_ratio: None,
            fold_count: 4,
            min_fold_bars: 30,
            annualization: 252.0,
            capacity_limit: 0.5,
            base_cost_bps: 5.0,
            liquidity_cost_bps: 25.0,
            impact_cost_bps: 20.0,
            liquidity_reference: 1.0,
            persistence_block: 21,
        }
    }
}

impl ConfigSection for BacktestingConfig {
    fn section_name() -> &'static str {
        "backtesting"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        if let Some(ratio) = self.train_ratio {
            if !(ratio > 0.0 && ratio < 1.0) {
                return Err(EvoAlphaError::Configuration(
                    "Train/test split must be between 0 and 1".to_string(),
                ));
            }
        }
        if self.fold_count == 0 {
            return Err(EvoAlphaError::Configuration(
                "Fold count must be at least 1".to_string(),
            ));
        }
        if self.min_fold_bars < 2 {
            return Err(EvoAlphaError::Configuration(
                "Minimum fold size must be at least 2 bars".to_string(),
            ));
        }
        if !is_positive(self.capacity_limit) || !is_positive(self.liquidity_reference) {
            return Err(EvoAlphaError::Configuration(
                "Capacity limit and liquidity reference must be positive and finite".to_string(),
            ));
        }
        if [self.base_cost_bps, self.liquidity_cost_bps, self.impact_cost_bps]
            .iter()
            .any(|c| !(c.is_finite() && *c >= 0.0))
        {
            return Err(EvoAlphaError::Configuration(
                "Cost coefficients must be finite and non-negative".to_string(),
            ));
        }
        if !is_positive(self.annualization) || self.persistence_block == 0 {
            return Err(EvoAlphaError::Configuration(
                "Annualization and persistence block must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(BacktestingConfig::default().validate().is_ok());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let cases = [
            BacktestingConfig { capacity_limit: f64::NAN, ..Default::default() },
            BacktestingConfig { capacity_limit: f64::INFINITY, ..Default::default() },
            BacktestingConfig { liquidity_reference: f64::NAN, ..Default::default() },
            BacktestingConfig { annualization: f64::NAN, ..Default::default() },
            BacktestingConfig { base_cost_bps: f64::NAN, ..Default::default() },
            BacktestingConfig { train_ratio: Some(f64::NAN), ..Default::default() },
            BacktestingConfig { train_ratio: Some(1.0), ..Default::default() },
        ];
        for config in &cases {
            assert!(config.validate().is_err(), "accepted {:?}", config);
        }
    }
}
