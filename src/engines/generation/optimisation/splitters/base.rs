use super::types::*;
use crate::data::ReturnTable;

pub trait DataSplitter: Send + Sync {
    /// Split a table into chronological folds
    fn split(&self, table: &ReturnTable) -> Vec<DataSplit>;

    /// Get splitter configuration
    fn config(&self) -> &SplitConfig;
}
