use crate::data::ReturnTable;

/// One walk-forward fold.
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub fold_num: usize,
    /// First row of the fold in the source table.
    pub start_row: usize,
    pub table: ReturnTable,
}

impl DataSplit {
    pub fn rows(&self) -> usize {
        self.table.rows()
    }
}

/// Configuration for data splitting
#[derive(Debug, Clone, PartialEq)]
pub struct SplitConfig {
    pub n_folds: usize,
    /// Folds with fewer bars are skipped by the validation method.
    pub min_fold_bars: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            n_folds: 4,
            min_fold_bars: 30,
        }
    }
}
