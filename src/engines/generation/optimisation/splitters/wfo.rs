use super::base::DataSplitter;
use super::types::{DataSplit, SplitConfig};
use crate::data::ReturnTable;

/// Non-overlapping consecutive folds covering the whole table. Fold sizes
/// differ by at most one bar; the earlier folds take the remainder.
pub struct WalkForwardSplitter {
    config: SplitConfig,
}

impl WalkForwardSplitter {
    pub fn new(n_folds: usize, min_fold_bars: usize) -> Self {
        Self {
            config: SplitConfig {
                n_folds: n_folds.max(1),
                min_fold_bars,
            },
        }
    }
}

impl DataSplitter for WalkForwardSplitter {
    fn split(&self, table: &ReturnTable) -> Vec<DataSplit> {
        let total_rows = table.rows();
        let n_folds = self.config.n_folds;
        let base = total_rows / n_folds;
        let remainder = total_rows % n_folds;

        let mut splits = Vec::with_capacity(n_folds);
        let mut start = 0;
        for fold in 0..n_folds {
            let size = base + usize::from(fold < remainder);
            splits.push(DataSplit {
                fold_num: fold,
                start_row: start,
                table: table.slice(start, size),
            });
            start += size;
        }
        splits
    }

    fn config(&self) -> &SplitConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> ReturnTable {
        ReturnTable::new(vec!["A".to_string()], vec![(0..rows).map(|i| i as f64 * 1e-4).collect()]).unwrap()
    }

    #[test]
    fn test_folds_cover_table_without_overlap() {
        let splits = WalkForwardSplitter::new(4, 30).split(&table(130));
        let sizes: Vec<usize> = splits.iter().map(DataSplit::rows).collect();
        assert_eq!(sizes, vec![33, 33, 32, 32]);
        assert_eq!(splits[1].start_row, 33);
        assert_eq!(splits[3].start_row, 98);
        assert!((splits[1].table.asset_returns(0)[0] - 33e-4).abs() < 1e-15);
    }

    #[test]
    fn test_short_table_yields_small_folds() {
        let splits = WalkForwardSplitter::new(5, 30).split(&table(3));
        assert_eq!(splits.len(), 5);
        assert_eq!(splits.iter().map(DataSplit::rows).sum::<usize>(), 3);
        assert_eq!(splits[4].rows(), 0);
    }
}
