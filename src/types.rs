use serde::{Deserialize, Serialize};

/// Statistics of one backtested window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub bars: usize,
    /// Annualised mean / std of net returns; 0.0 for degenerate series.
    pub sharpe: f64,
    /// Peak-to-trough loss of compounded equity, as a fraction in [0, 1].
    pub max_drawdown: f64,
    pub total_return: f64,
    /// Mean absolute executed position change per bar.
    pub turnover: f64,
    /// Executed / desired trade volume; 1.0 when nothing was requested.
    pub capacity: f64,
    /// Fraction of positive blocks (about one month each).
    pub persistence: f64,
    pub total_costs: f64,
}

/// Output of a single-window backtest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub metrics: WindowMetrics,
    /// Position held after trading at each bar.
    pub positions: Vec<f64>,
    /// Net-of-cost return at each bar.
    pub pnl: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldResult {
    pub fold_num: usize,
    pub start_row: usize,
    pub metrics: WindowMetrics,
}

/// Cross-fold aggregate used by the fitness terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub sharpe: f64,
    /// Dispersion of fold Sharpe ratios.
    pub sharpe_std: f64,
    pub max_drawdown: f64,
    pub total_return: f64,
    pub turnover: f64,
    pub capacity: f64,
    pub persistence: f64,
    /// Positive-fold fraction damped by Sharpe dispersion, in [0, 1].
    pub consistency: f64,
    pub folds_used: usize,
    pub folds_skipped: usize,
}

/// Walk-forward evaluation of one genome over one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub folds: Vec<FoldResult>,
    pub summary: PerformanceSummary,
    /// Positions of every used fold, concatenated in time order.
    pub positions: Vec<f64>,
    pub pnl: Vec<f64>,
    /// Equal-weighted market return aligned with `positions`.
    pub market: Vec<f64>,
}

impl WalkForwardResult {
    /// Zero-valued result for a table where every fold was skipped.
    pub fn zero(folds_skipped: usize) -> Self {
        Self {
            summary: PerformanceSummary {
                folds_skipped,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn has_data(&self) -> bool {
        self.summary.folds_used > 0
    }
}
