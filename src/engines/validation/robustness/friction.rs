use super::base::*;
use crate::data::ReturnTable;
use crate::engines::evaluation::StrategyParams;
use crate::engines::generation::optimisation::{ValidationMethod, WalkForwardMethod};
use crate::error::{EvoAlphaError, Result};
use serde_json::json;

/// Re-runs the strategy with every transaction cost multiplied.
pub struct FrictionTest {
    cost_multiplier: f64,
    max_degradation_pct: f64,
}

impl FrictionTest {
    pub fn new(cost_multiplier: f64) -> Self {
        Self {
            cost_multiplier,
            max_degradation_pct: 50.0,
        }
    }
}

impl Default for FrictionTest {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl RobustnessTest for FrictionTest {
    fn name(&self) -> &str {
        "Friction Test (Higher Costs)"
    }

    fn description(&self) -> &str {
        "Tests if strategy survives realistic trading conditions with higher execution costs"
    }

    fn run(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        method: &WalkForwardMethod,
    ) -> Result<TestResult> {
        let original = method.validate(params, table);
        if !original.has_data() {
            return Err(EvoAlphaError::InsufficientData {
                required: method.min_rows(),
                actual: table.rows(),
            });
        }
        let original_metric = original.summary.sharpe;

        let frictional = method
            .with_cost_multiplier(self.cost_multiplier)
            .validate(params, table);
        let friction_metric = frictional.summary.sharpe;

        // Calculate degradation
        let drop_pct = if original_metric != 0.0 {
            ((original_metric - friction_metric) / original_metric.abs()) * 100.0
        } else {
            0.0
        };

        let passed = original_metric > 0.0 && drop_pct <= self.max_degradation_pct;
        let score = ((self.max_degradation_pct - drop_pct) / self.max_degradation_pct).clamp(0.0, 1.0);

        let interpretation = if passed {
            format!(
                "Strategy survives {}x costs. Sharpe drop: {:.1}% (threshold: {:.1}%)",
                self.cost_multiplier, drop_pct, self.max_degradation_pct
            )
        } else {
            format!(
                "WARNING: Strategy is sensitive to costs. Sharpe drop with {}x costs: {:.1}% (threshold: {:.1}%)",
                self.cost_multiplier, drop_pct, self.max_degradation_pct
            )
        };

        Ok(TestResult {
            test_name: self.name().to_string(),
            passed,
            score,
            details: json!({
                "original_sharpe": original_metric,
                "friction_sharpe": friction_metric,
                "cost_multiplier": self.cost_multiplier,
                "drop_pct": drop_pct,
            }),
            interpretation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BacktestingConfig;

    #[test]
    fn test_friction_reports_both_sharpes() {
        let rows = 240;
        let a = (0..rows).map(|i| 0.002 + 0.01 * ((i as f64) * 0.5).sin()).collect();
        let table = ReturnTable::new(vec!["A".into()], vec![a]).unwrap();
        let params = StrategyParams::decode(&[3.0, 15.0, 0.0, 0.95, 10.0, 1.0]).unwrap();
        let method = WalkForwardMethod::from_config(&BacktestingConfig::default());

        let result = FrictionTest::default().run(&params, &table, &method).unwrap();
        assert!(result.details["original_sharpe"].as_f64().unwrap().is_finite());
        assert!(result.details["friction_sharpe"].as_f64().unwrap().is_finite());
        assert_eq!(result.details["cost_multiplier"].as_f64(), Some(2.0));
        assert!((0.0..=1.0).contains(&result.score));
    }
}
