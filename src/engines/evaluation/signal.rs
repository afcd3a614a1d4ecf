use crate::config::genome::RULE_GENE_COUNT;
use crate::error::{EvoAlphaError, Result};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;
/// Percentile distance over which the volatility gate ramps from open to shut.
const GATE_RAMP: f64 = 0.1;
/// Logistic approximation of the standard normal CDF.
const PROBIT_SCALE: f64 = 1.702;

/// Genome genes decoded into signal-rule settings and asset weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    pub fast_window: usize,
    pub slow_window: usize,
    pub momentum_threshold: f64,
    pub volatility_filter: f64,
    pub volatility_lookback: usize,
    pub weight_genes: Vec<f64>,
}

impl StrategyParams {
    pub fn decode(genes: &[f64]) -> Result<Self> {
        if genes.len() <= RULE_GENE_COUNT {
            return Err(EvoAlphaError::Evaluation(format!(
                "genome has {} genes, need more than {}",
                genes.len(),
                RULE_GENE_COUNT
            )));
        }
        let window = |v: f64| v.round().max(1.0) as usize;
        let fast_window = window(genes[0]);
        Ok(Self {
            fast_window,
            slow_window: window(genes[1]).max(fast_window + 1),
            momentum_threshold: genes[2].max(0.0),
            volatility_filter: genes[3],
            volatility_lookback: window(genes[4]).max(2),
            weight_genes: genes[RULE_GENE_COUNT..].iter().map(|w| w.max(0.0)).collect(),
        })
    }

    /// Weights over `n_assets`, cycling the weight genes and normalising to
    /// sum to one. All-zero genes fall back to equal weights.
    pub fn asset_weights(&self, n_assets: usize) -> Vec<f64> {
        if n_assets == 0 {
            return Vec::new();
        }
        let raw: Vec<f64> = (0..n_assets)
            .map(|i| self.weight_genes.get(i % self.weight_genes.len().max(1)).copied().unwrap_or(0.0))
            .collect();
        let total: f64 = raw.iter().sum();
        if total <= EPS {
            return vec![1.0 / n_assets as f64; n_assets];
        }
        raw.iter().map(|w| w / total).collect()
    }
}

/// Soft directional signal in [-1, 1] for one asset's return series.
///
/// Trend (fast vs slow average of cumulative return) and momentum beyond
/// the threshold are scaled by rolling volatility and squashed with `tanh`,
/// then damped by a volatility-percentile gate. Every window uses the bars
/// available so far, so the signal is causal and defined from the second bar.
pub fn asset_signal(returns: &[f64], params: &StrategyParams) -> Vec<f64> {
    let n = returns.len();
    let mut cumulative = Vec::with_capacity(n + 1);
    let mut sum_r = Vec::with_capacity(n + 1);
    let mut sum_r2 = Vec::with_capacity(n + 1);
    cumulative.push(0.0);
    sum_r.push(0.0);
    sum_r2.push(0.0);
    for &r in returns {
        let last = *sum_r.last().unwrap_or(&0.0);
        sum_r.push(last + r);
        let last_sq = *sum_r2.last().unwrap_or(&0.0);
        sum_r2.push(last_sq + r * r);
        cumulative.push(last + r);
    }
    // Prefix sums of the cumulative-return path for O(1) moving averages.
    let mut path_sum = Vec::with_capacity(n + 2);
    path_sum.push(0.0);
    for &p in &cumulative[1..] {
        let last = *path_sum.last().unwrap_or(&0.0);
        path_sum.push(last + p);
    }

    let mean_path = |t: usize, w: usize| {
        let len = w.min(t + 1);
        (path_sum[t + 1] - path_sum[t + 1 - len]) / len as f64
    };

    let mut vol_stats = RunningStats::default();
    let mut signal = Vec::with_capacity(n);

    for t in 0..n {
        let len = params.volatility_lookback.min(t + 1);
        let sigma = if len >= 2 {
            let s = sum_r[t + 1] - sum_r[t + 1 - len];
            let s2 = sum_r2[t + 1] - sum_r2[t + 1 - len];
            let mean = s / len as f64;
            ((s2 / len as f64 - mean * mean).max(0.0) * len as f64 / (len - 1) as f64).sqrt()
        } else {
            0.0
        };

        if t == 0 || sigma <= EPS {
            signal.push(0.0);
            continue;
        }

        let trend = mean_path(t, params.fast_window) - mean_path(t, params.slow_window);
        let trend_z = trend / (sigma * (params.slow_window as f64).sqrt());

        let fast_len = params.fast_window.min(t + 1);
        let momentum = (sum_r[t + 1] - sum_r[t + 1 - fast_len]) / fast_len as f64;
        let excess = soft_threshold(momentum, params.momentum_threshold);
        let momentum_z = excess * (fast_len as f64).sqrt() / sigma;

        let percentile = vol_stats.percentile(sigma);
        vol_stats.push(sigma);
        let gate = ((params.volatility_filter + GATE_RAMP - percentile) / GATE_RAMP).clamp(0.0, 1.0);

        signal.push((trend_z + momentum_z).tanh() * gate);
    }

    signal
}

/// Approximate percentile of `value` against a running mean/std, via a
/// logistic stand-in for the normal CDF. 0.5 until the history has spread.
pub(crate) fn logistic_percentile(value: f64, mean: f64, std: f64) -> f64 {
    if std <= EPS {
        return 0.5;
    }
    let z = (value - mean) / std;
    1.0 / (1.0 + (-PROBIT_SCALE * z).exp())
}

fn soft_threshold(x: f64, threshold: f64) -> f64 {
    x.signum() * (x.abs() - threshold).max(0.0)
}

/// Welford accumulator used for causal percentile estimates.
#[derive(Debug, Default, Clone)]
pub(crate) struct RunningStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub(crate) fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub(crate) fn std(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).sqrt()
        }
    }

    pub(crate) fn percentile(&self, value: f64) -> f64 {
        logistic_percentile(value, self.mean, self.std())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StrategyParams {
        StrategyParams::decode(&[5.0, 20.0, 0.001, 0.9, 10.0, 1.0, 1.0, 2.0]).unwrap()
    }

    #[test]
    fn test_decode_orders_windows() {
        let p = StrategyParams::decode(&[30.0, 10.0, 0.0, 0.8, 1.0, 0.5]).unwrap();
        assert_eq!(p.fast_window, 30);
        assert_eq!(p.slow_window, 31);
        assert_eq!(p.volatility_lookback, 2);
        assert!(StrategyParams::decode(&[5.0, 20.0, 0.0, 0.8, 10.0]).is_err());
    }

    #[test]
    fn test_weights_cycle_and_normalise() {
        let w = params().asset_weights(4);
        assert_eq!(w.len(), 4);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((w[0] - 1.0 / 5.0).abs() < 1e-12);
        assert!((w[2] - 2.0 / 5.0).abs() < 1e-12);
        assert!((w[3] - 1.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_fall_back_to_equal() {
        let p = StrategyParams::decode(&[5.0, 20.0, 0.0, 0.8, 10.0, 0.0, 0.0]).unwrap();
        assert_eq!(p.asset_weights(2), vec![0.5, 0.5]);
    }

    #[test]
    fn test_signal_is_bounded_and_follows_trend() {
        let up: Vec<f64> = (0..200).map(|i| 0.004 + 0.01 * ((i as f64) * 0.7).sin()).collect();
        let signal = asset_signal(&up, &params());
        assert_eq!(signal.len(), 200);
        assert!(signal.iter().all(|s| s.abs() <= 1.0));
        let late_mean = signal[100..].iter().sum::<f64>() / 100.0;
        assert!(late_mean > 0.0);
    }

    #[test]
    fn test_constant_returns_give_flat_signal() {
        let flat = vec![0.001; 50];
        assert!(asset_signal(&flat, &params()).iter().all(|&s| s == 0.0));
    }
}
