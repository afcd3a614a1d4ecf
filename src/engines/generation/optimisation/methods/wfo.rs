use super::base::*;
use crate::config::BacktestingConfig;
use crate::data::ReturnTable;
use crate::engines::evaluation::{Backtester, StrategyParams};
use crate::engines::generation::optimisation::splitters::{
    base::DataSplitter, types::DataSplit, wfo::WalkForwardSplitter,
};
use crate::types::{FoldResult, PerformanceSummary, WalkForwardResult};

pub struct WalkForwardMethod {
    splitter: WalkForwardSplitter,
    backtester: Backtester,
}

impl WalkForwardMethod {
    pub fn new(n_folds: usize, min_fold_bars: usize, backtester: Backtester) -> Self {
        Self {
            splitter: WalkForwardSplitter::new(n_folds, min_fold_bars),
            backtester,
        }
    }

    pub fn from_config(config: &BacktestingConfig) -> Self {
        Self::new(config.fold_count, config.min_fold_bars, Backtester::new(config))
    }

    /// Smallest table with at least one usable fold.
    pub fn min_rows(&self) -> usize {
        let split = self.splitter.config();
        split.n_folds * split.min_fold_bars.saturating_sub(1) + 1
    }

    /// Same folding with costs scaled by `multiplier`.
    pub fn with_cost_multiplier(&self, multiplier: f64) -> Self {
        let split = self.splitter.config();
        Self::new(
            split.n_folds,
            split.min_fold_bars,
            self.backtester.with_cost_multiplier(multiplier),
        )
    }
}

impl ValidationMethod for WalkForwardMethod {
    fn name(&self) -> &str {
        "Walk-Forward"
    }

    fn validate(&self, params: &StrategyParams, table: &ReturnTable) -> WalkForwardResult {
        let min_bars = self.splitter.config().min_fold_bars;
        let (usable, skipped): (Vec<DataSplit>, Vec<DataSplit>) = self
            .splitter
            .split(table)
            .into_iter()
            .partition(|split| split.rows() >= min_bars && split.rows() > 0);

        if usable.is_empty() {
            log::debug!(
                "All {} folds skipped ({} rows, minimum {} per fold)",
                skipped.len(),
                table.rows(),
                min_bars
            );
            return WalkForwardResult::zero(skipped.len());
        }

        let mut result = WalkForwardResult::default();
        for split in &usable {
            let run = self.backtester.run(params, &split.table);
            result.positions.extend_from_slice(&run.positions);
            result.pnl.extend_from_slice(&run.pnl);
            result.market.extend(split.table.market_returns());
            result.folds.push(FoldResult {
                fold_num: split.fold_num,
                start_row: split.start_row,
                metrics: run.metrics,
            });
        }
        result.summary = aggregate_metrics(&result.folds, skipped.len());
        result
    }
}

fn aggregate_metrics(folds: &[FoldResult], folds_skipped: usize) -> PerformanceSummary {
    if folds.is_empty() {
        return PerformanceSummary {
            folds_skipped,
            ..Default::default()
        };
    }

    let mean_of = |f: fn(&FoldResult) -> f64| folds.iter().map(f).sum::<f64>() / folds.len() as f64;
    let sharpes: Vec<f64> = folds.iter().map(|f| f.metrics.sharpe).collect();
    let sharpe = mean_of(|f| f.metrics.sharpe);
    let sharpe_std = calculate_std(&sharpes, sharpe);
    let positive = sharpes.iter().filter(|s| **s > 0.0).count() as f64 / folds.len() as f64;

    PerformanceSummary {
        sharpe,
        sharpe_std,
        max_drawdown: mean_of(|f| f.metrics.max_drawdown),
        total_return: mean_of(|f| f.metrics.total_return),
        turnover: mean_of(|f| f.metrics.turnover),
        capacity: mean_of(|f| f.metrics.capacity),
        persistence: mean_of(|f| f.metrics.persistence),
        // Lower dispersion = more consistent
        consistency: positive / (1.0 + sharpe_std),
        folds_used: folds.len(),
        folds_skipped,
    }
}

fn calculate_std(values: &[f64], mean: f64) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }

    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        StrategyParams::decode(&[3.0, 12.0, 0.0, 0.95, 8.0, 1.0, 0.5]).unwrap()
    }

    fn table(rows: usize) -> ReturnTable {
        let a = (0..rows).map(|i| 0.002 + 0.01 * ((i as f64) * 0.7).sin()).collect();
        let b = (0..rows).map(|i| -0.001 + 0.006 * ((i as f64) * 0.3).cos()).collect();
        ReturnTable::new(vec!["A".into(), "B".into()], vec![a, b]).unwrap()
    }

    fn method() -> WalkForwardMethod {
        WalkForwardMethod::from_config(&BacktestingConfig::default())
    }

    #[test]
    fn test_all_folds_skipped_on_short_table() {
        assert_eq!(method().min_rows(), 117);
        let result = method().validate(&params(), &table(100));
        assert!(!result.has_data());
        assert_eq!(result.summary.folds_skipped, 4);
        assert_eq!(result.summary.sharpe, 0.0);
        assert!(result.positions.is_empty());
    }

    #[test]
    fn test_folds_aggregate() {
        let result = method().validate(&params(), &table(200));
        assert_eq!(result.summary.folds_used, 4);
        assert_eq!(result.summary.folds_skipped, 0);
        assert_eq!(result.positions.len(), 200);
        assert_eq!(result.market.len(), 200);
        assert!(result.summary.consistency >= 0.0 && result.summary.consistency <= 1.0);
        let mean: f64 = result.folds.iter().map(|f| f.metrics.sharpe).sum::<f64>() / 4.0;
        assert!((result.summary.sharpe - mean).abs() < 1e-12);
    }

    #[test]
    fn test_consistency_matches_dispersion() {
        let folds: Vec<FoldResult> = [1.0, 3.0, -1.0]
            .iter()
            .enumerate()
            .map(|(i, s)| FoldResult {
                fold_num: i,
                start_row: i * 30,
                metrics: crate::types::WindowMetrics {
                    sharpe: *s,
                    ..Default::default()
                },
            })
            .collect();
        let summary = aggregate_metrics(&folds, 1);
        assert!((summary.sharpe - 1.0).abs() < 1e-12);
        assert!((summary.sharpe_std - 2.0).abs() < 1e-12);
        assert!((summary.consistency - (2.0 / 3.0) / 3.0).abs() < 1e-12);
        assert_eq!(summary.folds_skipped, 1);
    }
}
