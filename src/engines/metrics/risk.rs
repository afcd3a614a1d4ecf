// src/engines/metrics/risk.rs

/// Standard deviations below this are treated as zero variance.
pub const MIN_STD: f64 = 1e-12;

pub struct RiskMetrics;

impl RiskMetrics {
    /// Annualised mean / sample std of per-bar returns. Fewer than two bars,
    /// zero variance or a non-finite result all give 0.0.
    pub fn sharpe_ratio(returns: &[f64], annualization: f64) -> f64 {
        if returns.len() < 2 {
            return 0.0;
        }
        let std = Self::std_dev(returns);
        if !std.is_finite() || std < MIN_STD {
            return 0.0;
        }
        let sharpe = Self::mean(returns) / std * annualization.sqrt();
        if sharpe.is_finite() {
            sharpe
        } else {
            0.0
        }
    }

    /// Largest peak-to-trough loss of compounded equity, as a fraction.
    pub fn max_drawdown(returns: &[f64]) -> f64 {
        let mut equity = 1.0_f64;
        let mut peak = 1.0_f64;
        let mut max_dd = 0.0_f64;

        for r in returns {
            equity *= 1.0 + r;
            if equity > peak {
                peak = equity;
            }
            if peak > 0.0 {
                max_dd = max_dd.max((peak - equity) / peak);
            }
        }

        max_dd.clamp(0.0, 1.0)
    }

    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    pub fn std_dev(values: &[f64]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }

        let mean = Self::mean(values);
        let variance = values.iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>() / (values.len() - 1) as f64;

        variance.sqrt()
    }

    /// Sample skewness; 0.0 for degenerate input.
    pub fn skewness(values: &[f64]) -> f64 {
        Self::standardised_moment(values, 3)
    }

    /// Excess kurtosis; 0.0 for degenerate input.
    pub fn excess_kurtosis(values: &[f64]) -> f64 {
        let m4 = Self::standardised_moment(values, 4);
        if m4 == 0.0 {
            0.0
        } else {
            m4 - 3.0
        }
    }

    pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
        if values.len() <= lag + 1 {
            return 0.0;
        }
        Self::correlation(&values[..values.len() - lag], &values[lag..])
    }

    /// Pearson correlation over the common prefix; 0.0 when either side is flat.
    pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
        let n = a.len().min(b.len());
        if n < 2 {
            return 0.0;
        }
        let (a, b) = (&a[..n], &b[..n]);
        let (mean_a, mean_b) = (Self::mean(a), Self::mean(b));
        let mut cov = 0.0;
        let mut var_a = 0.0;
        let mut var_b = 0.0;
        for (x, y) in a.iter().zip(b) {
            cov += (x - mean_a) * (y - mean_b);
            var_a += (x - mean_a).powi(2);
            var_b += (y - mean_b).powi(2);
        }
        let denom = (var_a * var_b).sqrt();
        if !denom.is_finite() || denom < MIN_STD {
            return 0.0;
        }
        (cov / denom).clamp(-1.0, 1.0)
    }

    fn standardised_moment(values: &[f64], order: i32) -> f64 {
        let n = values.len();
        if n < 3 {
            return 0.0;
        }
        let mean = Self::mean(values);
        let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        if m2.sqrt() < MIN_STD {
            return 0.0;
        }
        let mk = values.iter().map(|v| (v - mean).powi(order)).sum::<f64>() / n as f64;
        let moment = mk / m2.powf(order as f64 / 2.0);
        if moment.is_finite() {
            moment
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe_of_constant_series_is_zero() {
        assert_eq!(RiskMetrics::sharpe_ratio(&[0.01; 50], 252.0), 0.0);
        assert_eq!(RiskMetrics::sharpe_ratio(&[0.0; 50], 252.0), 0.0);
        assert_eq!(RiskMetrics::sharpe_ratio(&[0.01], 252.0), 0.0);
    }

    #[test]
    fn test_sharpe_sign_follows_mean() {
        let up = [0.01, 0.02, 0.0, 0.015];
        let down: Vec<f64> = up.iter().map(|r| -r).collect();
        assert!(RiskMetrics::sharpe_ratio(&up, 252.0) > 0.0);
        assert!(RiskMetrics::sharpe_ratio(&down, 252.0) < 0.0);
    }

    #[test]
    fn test_max_drawdown() {
        let dd = RiskMetrics::max_drawdown(&[0.1, -0.5, 0.2]);
        assert!((dd - 0.5).abs() < 1e-12);
        assert_eq!(RiskMetrics::max_drawdown(&[]), 0.0);
        assert_eq!(RiskMetrics::max_drawdown(&[-2.0]), 1.0);
    }

    #[test]
    fn test_moments() {
        let symmetric = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(RiskMetrics::skewness(&symmetric).abs() < 1e-12);
        assert_eq!(RiskMetrics::skewness(&[1.0; 10]), 0.0);
        assert_eq!(RiskMetrics::excess_kurtosis(&[1.0; 10]), 0.0);
        let right_tail = [0.0, 0.0, 0.0, 0.0, 10.0];
        assert!(RiskMetrics::skewness(&right_tail) > 0.0);
    }

    #[test]
    fn test_correlation() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        assert!((RiskMetrics::correlation(&a, &b) - 1.0).abs() < 1e-12);
        assert_eq!(RiskMetrics::correlation(&a, &[1.0; 4]), 0.0);
        assert!((RiskMetrics::autocorrelation(&[1.0, -1.0, 1.0, -1.0, 1.0], 1) + 1.0).abs() < 1e-12);
    }
}
