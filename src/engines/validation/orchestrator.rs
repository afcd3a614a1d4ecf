use super::robustness::{
    base::*,
    friction::FrictionTest,
    regime_shock::RegimeShockTest,
};
use crate::config::{BacktestingConfig, FitnessConfig};
use crate::data::ReturnTable;
use crate::engines::evaluation::StrategyParams;
use crate::engines::generation::optimisation::WalkForwardMethod;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessReport {
    pub strategy_id: String,
    pub timestamp: String,
    pub test_results: Vec<TestResult>,
    pub overall_score: f64,
    pub passed_all: bool,
    pub summary: String,
}

/// Stress tests run once per accepted elite; the report goes into the
/// record's metrics blob.
pub struct ValidationOrchestrator {
    method: WalkForwardMethod,
    tests: Vec<Box<dyn RobustnessTest>>,
}

impl ValidationOrchestrator {
    pub fn new(backtesting: &BacktestingConfig, fitness: &FitnessConfig) -> Self {
        let tests: Vec<Box<dyn RobustnessTest>> = vec![
            Box::new(RegimeShockTest::new(fitness.shocks.clone(), fitness.robustness_floor)),
            Box::new(FrictionTest::default()),
        ];

        Self {
            method: WalkForwardMethod::from_config(backtesting),
            tests,
        }
    }

    pub fn test_names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name()).collect()
    }

    pub fn run_robustness_report(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        strategy_id: String,
    ) -> Result<RobustnessReport> {
        let mut test_results = Vec::with_capacity(self.tests.len());
        for test in &self.tests {
            log::debug!("{} on {}: {}", test.name(), strategy_id, test.description());
            test_results.push(test.run(params, table, &self.method)?);
        }

        let overall_score = test_results.iter().map(|r| r.score).sum::<f64>() / test_results.len().max(1) as f64;
        let failed: Vec<&str> = test_results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.test_name.as_str())
            .collect();
        let passed_all = failed.is_empty();
        let summary = if passed_all {
            format!("{} robustness tests passed, score {:.2}", test_results.len(), overall_score)
        } else {
            format!(
                "failed {} of {} robustness tests ({}), score {:.2}",
                failed.len(),
                test_results.len(),
                failed.join(", "),
                overall_score
            )
        };

        Ok(RobustnessReport {
            strategy_id,
            timestamp: chrono::Utc::now().to_rfc3339(),
            test_results,
            overall_score,
            passed_all,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SyntheticMarketData;

    #[test]
    fn test_report_covers_every_test() {
        let orchestrator =
            ValidationOrchestrator::new(&BacktestingConfig::default(), &FitnessConfig::default());
        let params = StrategyParams::decode(&[4.0, 30.0, 0.001, 0.9, 15.0, 0.6, 0.4]).unwrap();
        let data = SyntheticMarketData::new(2, 400, 5).unwrap();

        let report = orchestrator
            .run_robustness_report(&params, data.table(), "abc123".to_string())
            .unwrap();
        assert_eq!(report.strategy_id, "abc123");
        assert_eq!(report.test_results.len(), orchestrator.test_names().len());
        assert_eq!(report.passed_all, report.test_results.iter().all(|r| r.passed));
        assert!(report.overall_score.is_finite());
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let orchestrator =
            ValidationOrchestrator::new(&BacktestingConfig::default(), &FitnessConfig::default());
        let params = StrategyParams::decode(&[4.0, 30.0, 0.001, 0.9, 15.0, 0.6]).unwrap();
        assert!(orchestrator
            .run_robustness_report(&params, &ReturnTable::empty(), "x".to_string())
            .is_err());
    }
}
