use super::composite::{Evaluation, EvaluationMetrics, FitnessTuple};
use super::novelty::diversity;
use crate::config::{BacktestingConfig, FitnessConfig, FitnessWeights};
use crate::data::{DataValidator, MarketDataProvider, ReturnTable};
use crate::engines::evaluation::StrategyParams;
use crate::engines::generation::optimisation::{ValidationMethod, WalkForwardMethod};
use crate::engines::metrics::BehaviourFingerprint;
use crate::engines::validation::RegimeShockTest;
use crate::error::Result;
use crate::types::PerformanceSummary;

/// Immutable in-sample / out-of-sample tables shared by every evaluation of
/// a run.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub in_sample: ReturnTable,
    pub out_of_sample: ReturnTable,
}

impl MarketSnapshot {
    pub fn new(in_sample: ReturnTable, out_of_sample: ReturnTable) -> Self {
        Self {
            in_sample,
            out_of_sample,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Fetches the configured lookback once and splits it chronologically.
    /// Non-finite returns are replaced with zero and logged.
    pub fn load(provider: &dyn MarketDataProvider, config: &BacktestingConfig) -> Result<Self> {
        let (in_sample, out_of_sample) =
            provider.get_train_test_split(config.train_ratio, config.lookback_bars)?;
        Ok(Self::new(
            DataValidator::sanitize(in_sample),
            DataValidator::sanitize(out_of_sample),
        ))
    }

    /// `InsufficientData` when the snapshot holds fewer than `min_rows` rows.
    pub fn require_rows(self, min_rows: usize) -> Result<Self> {
        DataValidator::validate_minimum_rows(self.rows(), min_rows)?;
        Ok(self)
    }

    pub fn rows(&self) -> usize {
        self.in_sample.rows() + self.out_of_sample.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.in_sample.is_empty() && self.out_of_sample.is_empty()
    }
}

/// Output of the parallel evaluation phase. `None` marks a term that could
/// not be computed; it contributes zero to the composite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BehaviourEvaluation {
    pub in_sample: Option<PerformanceSummary>,
    pub out_of_sample: Option<PerformanceSummary>,
    pub fingerprint: BehaviourFingerprint,
    pub robustness: Option<f64>,
}

pub struct FitnessPipeline {
    weights: FitnessWeights,
    method: WalkForwardMethod,
    shock_test: RegimeShockTest,
}

impl FitnessPipeline {
    pub fn new(backtesting: &BacktestingConfig, fitness: &FitnessConfig) -> Self {
        Self {
            weights: fitness.weights,
            method: WalkForwardMethod::from_config(backtesting),
            shock_test: RegimeShockTest::new(fitness.shocks.clone(), fitness.robustness_floor),
        }
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Backtests, fingerprint and shock robustness for one genome. Reads
    /// only the snapshot, so it can run on any worker thread.
    pub fn evaluate_behaviour(&self, genes: &[f64], snapshot: &MarketSnapshot) -> BehaviourEvaluation {
        let params = match StrategyParams::decode(genes) {
            Ok(params) => params,
            Err(e) => {
                log::debug!("Genome decode failed: {}", e);
                return BehaviourEvaluation::default();
            }
        };

        let in_sample = self.method.validate(&params, &snapshot.in_sample);
        let out_of_sample = self.method.validate(&params, &snapshot.out_of_sample);

        let fingerprint = BehaviourFingerprint::from_series(&out_of_sample.positions, &out_of_sample.market);
        let robustness = if out_of_sample.has_data() {
            self.shock_test
                .robustness(&params, &snapshot.out_of_sample, &self.method)
        } else {
            None
        };

        BehaviourEvaluation {
            in_sample: in_sample.has_data().then_some(in_sample.summary),
            out_of_sample: out_of_sample.has_data().then_some(out_of_sample.summary),
            fingerprint,
            robustness,
        }
    }

    /// Combines the behaviour terms with a novelty score into the final
    /// fitness tuple and metrics.
    pub fn score(&self, behaviour: &BehaviourEvaluation, novelty: f64) -> Evaluation {
        let novelty = if novelty.is_finite() { novelty.max(0.0) } else { 0.0 };
        let diversity = diversity(novelty);
        let oos = behaviour.out_of_sample.as_ref();

        let overfit_gap = match (&behaviour.in_sample, oos) {
            (Some(is), Some(oos)) => (is.sharpe - oos.sharpe).abs(),
            _ => 0.0,
        };
        let robustness = behaviour.robustness.unwrap_or(0.0);

        let fitness = FitnessTuple::from_terms(
            oos.map_or(0.0, |s| s.sharpe),
            oos.map_or(0.0, |s| 1.0 - s.max_drawdown.abs()),
            oos.map_or(0.0, |s| s.consistency),
            diversity,
            robustness,
            overfit_gap,
            &self.weights,
        );

        Evaluation {
            fitness,
            metrics: EvaluationMetrics {
                in_sample: behaviour.in_sample.clone().unwrap_or_default(),
                out_of_sample: oos.cloned().unwrap_or_default(),
                novelty,
                diversity,
                robustness,
                overfit_gap,
                capacity: oos.map_or(0.0, |s| s.capacity),
            },
            fingerprint: behaviour.fingerprint,
        }
    }

    /// Same evaluation with a fresh novelty score; every other term is kept.
    pub fn rescore_novelty(&self, evaluation: &Evaluation, novelty: f64) -> Evaluation {
        let novelty = if novelty.is_finite() { novelty.max(0.0) } else { 0.0 };
        let diversity = diversity(novelty);
        let mut rescored = evaluation.clone();
        rescored.fitness.novelty = diversity;
        rescored.fitness.composite = rescored.fitness.composite_with(&self.weights);
        rescored.metrics.novelty = novelty;
        rescored.metrics.diversity = diversity;
        rescored
    }
}
