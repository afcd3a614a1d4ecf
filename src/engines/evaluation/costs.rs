use super::signal::RunningStats;
use crate::config::BacktestingConfig;

const BPS: f64 = 10_000.0;

/// Closed-form transaction-cost penalty.
///
/// Basis-point cost grows as bar liquidity falls below its running norm and
/// as the trade grows relative to the liquidity reference.
#[derive(Debug, Clone, PartialEq)]
pub struct CostModel {
    pub base_bps: f64,
    pub liquidity_bps: f64,
    pub impact_bps: f64,
    pub liquidity_reference: f64,
    /// Scales the whole penalty; 1.0 in normal evaluation.
    pub multiplier: f64,
}

impl CostModel {
    pub fn from_config(config: &BacktestingConfig) -> Self {
        Self {
            base_bps: config.base_cost_bps,
            liquidity_bps: config.liquidity_cost_bps,
            impact_bps: config.impact_cost_bps,
            liquidity_reference: config.liquidity_reference,
            multiplier: 1.0,
        }
    }

    pub fn bps(&self, trade: f64, volume_percentile: f64) -> f64 {
        let size_ratio = trade.abs() / self.liquidity_reference;
        self.base_bps
            + self.liquidity_bps * (1.0 - volume_percentile.clamp(0.0, 1.0))
            + self.impact_bps * size_ratio
    }

    pub fn cost(&self, trade: f64, volume_percentile: f64) -> f64 {
        trade.abs() * self.bps(trade, volume_percentile) / BPS * self.multiplier
    }
}

/// Weighted volume percentile per bar, each asset's volume compared with its
/// own running history. Without volumes every bar sits at the median.
pub fn volume_percentiles(volumes: &[Option<&[f64]>], weights: &[f64], bars: usize) -> Vec<f64> {
    if volumes.is_empty() || volumes.iter().any(Option::is_none) {
        return vec![0.5; bars];
    }
    let mut stats = vec![RunningStats::default(); volumes.len()];
    (0..bars)
        .map(|t| {
            let mut pct = 0.0;
            for (asset, column) in volumes.iter().enumerate() {
                let value = column.and_then(|c| c.get(t)).copied().unwrap_or(0.0);
                let weight = weights.get(asset).copied().unwrap_or(0.0);
                pct += weight * stats[asset].percentile(value);
                stats[asset].push(value);
            }
            pct
        })
        .collect()
}
