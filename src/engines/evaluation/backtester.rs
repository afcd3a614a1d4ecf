use super::costs::{volume_percentiles, CostModel};
use super::signal::{asset_signal, StrategyParams};
use crate::config::BacktestingConfig;
use crate::data::ReturnTable;
use crate::engines::metrics::{MetricsEngine, WindowSeries};
use crate::types::BacktestRun;

/// Single-window backtest: decoded genome + return table -> positions and
/// net-of-cost P&L.
#[derive(Debug, Clone)]
pub struct Backtester {
    costs: CostModel,
    capacity_limit: f64,
    annualization: f64,
    persistence_block: usize,
}

impl Backtester {
    pub fn new(config: &BacktestingConfig) -> Self {
        Self {
            costs: CostModel::from_config(config),
            capacity_limit: config.capacity_limit,
            annualization: config.annualization,
            persistence_block: config.persistence_block,
        }
    }

    /// Same backtester with every cost scaled by `multiplier`.
    pub fn with_cost_multiplier(&self, multiplier: f64) -> Self {
        let mut scaled = self.clone();
        scaled.costs.multiplier = multiplier;
        scaled
    }

    pub fn run(&self, params: &StrategyParams, table: &ReturnTable) -> BacktestRun {
        let bars = table.rows();
        if table.is_empty() {
            return BacktestRun::default();
        }

        let weights = params.asset_weights(table.n_assets());
        let signals: Vec<Vec<f64>> = (0..table.n_assets())
            .map(|a| asset_signal(table.asset_returns(a), params))
            .collect();
        let volumes: Vec<Option<&[f64]>> = (0..table.n_assets())
            .map(|a| table.asset_volumes(a))
            .collect();
        let volume_pct = volume_percentiles(&volumes, &weights, bars);

        let mut positions = Vec::with_capacity(bars);
        let mut pnl = Vec::with_capacity(bars);
        let mut position = 0.0;
        let mut executed_total = 0.0;
        let mut desired_total = 0.0;
        let mut total_costs = 0.0;

        for t in 0..bars {
            let portfolio_return: f64 = weights
                .iter()
                .enumerate()
                .map(|(a, w)| w * table.asset_returns(a)[t])
                .sum();
            let gross = position * portfolio_return;

            let target: f64 = weights
                .iter()
                .zip(&signals)
                .map(|(w, s)| w * s[t])
                .sum();
            let desired = target - position;
            let executed = desired.clamp(-self.capacity_limit, self.capacity_limit);
            let cost = self.costs.cost(executed, volume_pct[t]);

            position += executed;
            executed_total += executed.abs();
            desired_total += desired.abs();
            total_costs += cost;

            positions.push(position);
            pnl.push(gross - cost);
        }

        let metrics = MetricsEngine::new(self.annualization, self.persistence_block).calculate_all(
            WindowSeries {
                pnl: &pnl,
                executed: executed_total,
                desired: desired_total,
                costs: total_costs,
            },
        );

        BacktestRun { metrics, positions, pnl }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        StrategyParams::decode(&[5.0, 20.0, 0.0, 0.9, 10.0, 1.0, 1.0]).unwrap()
    }

    fn trending_table(bars: usize) -> ReturnTable {
        let a: Vec<f64> = (0..bars).map(|i| 0.003 + 0.01 * ((i as f64) * 0.9).sin()).collect();
        let b: Vec<f64> = (0..bars).map(|i| 0.002 + 0.008 * ((i as f64) * 1.3).cos()).collect();
        ReturnTable::new(vec!["A".to_string(), "B".to_string()], vec![a, b]).unwrap()
    }

    #[test]
    fn test_trades_are_capped_by_capacity() {
        let config = BacktestingConfig {
            capacity_limit: 0.05,
            ..Default::default()
        };
        let run = Backtester::new(&config).run(&params(), &trending_table(120));
        assert_eq!(run.positions.len(), 120);
        let mut previous = 0.0;
        for &p in &run.positions {
            assert!((p - previous).abs() <= 0.05 + 1e-12);
            previous = p;
        }
        assert!(run.metrics.capacity <= 1.0);
    }

    #[test]
    fn test_costs_reduce_returns() {
        let backtester = Backtester::new(&BacktestingConfig::default());
        let table = trending_table(150);
        let cheap = backtester.with_cost_multiplier(0.0).run(&params(), &table);
        let normal = backtester.run(&params(), &table);
        let expensive = backtester.with_cost_multiplier(3.0).run(&params(), &table);
        assert_eq!(cheap.metrics.total_costs, 0.0);
        assert!(normal.metrics.total_costs > 0.0);
        assert!(cheap.metrics.total_return > normal.metrics.total_return);
        assert!(normal.metrics.total_return > expensive.metrics.total_return);
    }

    #[test]
    fn test_empty_table_gives_default_run() {
        let run = Backtester::new(&BacktestingConfig::default()).run(&params(), &ReturnTable::empty());
        assert_eq!(run, BacktestRun::default());
    }
}
