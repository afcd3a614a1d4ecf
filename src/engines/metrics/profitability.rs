// src/engines/metrics/profitability.rs

pub struct ProfitabilityMetrics;

impl ProfitabilityMetrics {
    /// Compounded return of a per-bar return series.
    pub fn total_return(returns: &[f64]) -> f64 {
        returns.iter().fold(1.0, |equity, r| equity * (1.0 + r)) - 1.0
    }

    /// Fraction of `block`-bar blocks with a positive compounded return.
    /// A series shorter than one block counts as a single block; a trailing
    /// partial block is ignored otherwise.
    pub fn persistence(returns: &[f64], block: usize) -> f64 {
        if returns.is_empty() || block == 0 {
            return 0.0;
        }

        let blocks: Vec<&[f64]> = if returns.len() < block {
            vec![returns]
        } else {
            returns.chunks_exact(block).collect()
        };
        let positive = blocks
            .iter()
            .filter(|b| Self::total_return(b) > 0.0)
            .count();

        positive as f64 / blocks.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_return_compounds() {
        let r = ProfitabilityMetrics::total_return(&[0.1, 0.1]);
        assert!((r - 0.21).abs() < 1e-12);
        assert_eq!(ProfitabilityMetrics::total_return(&[]), 0.0);
    }

    #[test]
    fn test_persistence_blocks() {
        let mut returns = vec![0.01; 21];
        returns.extend(vec![-0.01; 21]);
        returns.extend(vec![0.05; 5]);
        assert!((ProfitabilityMetrics::persistence(&returns, 21) - 0.5).abs() < 1e-12);
        assert_eq!(ProfitabilityMetrics::persistence(&[0.01, 0.02], 21), 1.0);
        assert_eq!(ProfitabilityMetrics::persistence(&[], 21), 0.0);
    }
}
