use super::RiskMetrics;
use serde::{Deserialize, Serialize};

pub const FINGERPRINT_DIM: usize = 8;

/// Position scale of the smooth long-fraction indicator.
const LONG_SCALE: f64 = 0.05;

/// Behavioural descriptor of a strategy, built from its out-of-sample
/// position series and the market it traded.
///
/// Dimensions: position mean, position std, squashed skew, squashed excess
/// kurtosis, smooth fraction of time long, lag-1 autocorrelation, mean
/// absolute position change, correlation with the market return. Each is a
/// continuous function of the positions, so nearby genomes land nearby.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BehaviourFingerprint(pub [f64; FINGERPRINT_DIM]);

impl Default for BehaviourFingerprint {
    fn default() -> Self {
        Self([0.0; FINGERPRINT_DIM])
    }
}

impl BehaviourFingerprint {
    pub fn from_series(positions: &[f64], market: &[f64]) -> Self {
        if positions.is_empty() {
            return Self::default();
        }

        let turnover = if positions.len() < 2 {
            0.0
        } else {
            positions.windows(2).map(|w| (w[1] - w[0]).abs()).sum::<f64>()
                / (positions.len() - 1) as f64
        };
        let long_fraction = RiskMetrics::mean(
            &positions
                .iter()
                .map(|p| 0.5 * (1.0 + (p / LONG_SCALE).tanh()))
                .collect::<Vec<_>>(),
        );

        let values = [
            RiskMetrics::mean(positions),
            RiskMetrics::std_dev(positions),
            squash(RiskMetrics::skewness(positions)),
            squash(RiskMetrics::excess_kurtosis(positions)),
            long_fraction,
            RiskMetrics::autocorrelation(positions, 1),
            turnover,
            RiskMetrics::correlation(positions, market),
        ];
        Self(values.map(|v| if v.is_finite() { v } else { 0.0 }))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn euclidean(&self, other: &Self) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

fn squash(x: f64) -> f64 {
    x / (1.0 + x.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_positions_give_zero() {
        assert_eq!(BehaviourFingerprint::from_series(&[], &[]), BehaviourFingerprint::default());
    }

    #[test]
    fn test_long_only_series() {
        let positions = vec![0.5; 40];
        let market: Vec<f64> = (0..40).map(|i| (i as f64).sin() * 0.01).collect();
        let fp = BehaviourFingerprint::from_series(&positions, &market);
        assert!((fp.0[0] - 0.5).abs() < 1e-12);
        assert!(fp.0[1].abs() < 1e-12);
        assert!(fp.0[4] > 0.99);
        assert_eq!(fp.0[6], 0.0);
        assert_eq!(fp.0[7], 0.0);
    }

    #[test]
    fn test_small_position_change_moves_fingerprint_little() {
        let positions: Vec<f64> = (0..60).map(|i| 0.3 * ((i as f64) * 0.4).sin()).collect();
        let nudged: Vec<f64> = positions.iter().map(|p| p * 1.001 + 1e-4).collect();
        let market: Vec<f64> = (0..60).map(|i| 0.01 * ((i as f64) * 0.4).sin()).collect();
        let a = BehaviourFingerprint::from_series(&positions, &market);
        let b = BehaviourFingerprint::from_series(&nudged, &market);
        assert!(a.euclidean(&b) < 0.01);
        assert!(a.euclidean(&a) == 0.0);
    }
}
