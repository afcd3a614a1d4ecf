// src/engines/metrics/engine.rs
use crate::engines::metrics::{ProfitabilityMetrics, RiskMetrics};
use crate::types::WindowMetrics;

/// Raw per-bar series produced by one backtest window.
#[derive(Debug, Clone, Copy)]
pub struct WindowSeries<'a> {
    pub pnl: &'a [f64],
    /// Total absolute executed trade size.
    pub executed: f64,
    /// Total absolute trade size the signal asked for.
    pub desired: f64,
    pub costs: f64,
}

pub struct MetricsEngine {
    annualization: f64,
    persistence_block: usize,
}

impl MetricsEngine {
    pub fn new(annualization: f64, persistence_block: usize) -> Self {
        Self {
            annualization,
            persistence_block,
        }
    }

    pub fn calculate_all(&self, series: WindowSeries<'_>) -> WindowMetrics {
        let bars = series.pnl.len();
        if bars == 0 {
            return WindowMetrics::default();
        }

        let capacity = if series.desired > 0.0 {
            (series.executed / series.desired).clamp(0.0, 1.0)
        } else {
            1.0
        };

        WindowMetrics {
            bars,
            sharpe: RiskMetrics::sharpe_ratio(series.pnl, self.annualization),
            max_drawdown: RiskMetrics::max_drawdown(series.pnl),
            total_return: ProfitabilityMetrics::total_return(series.pnl),
            turnover: series.executed / bars as f64,
            capacity,
            persistence: ProfitabilityMetrics::persistence(series.pnl, self.persistence_block),
            total_costs: series.costs,
        }
    }
}
