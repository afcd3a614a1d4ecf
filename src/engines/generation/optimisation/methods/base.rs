use crate::data::ReturnTable;
use crate::engines::evaluation::StrategyParams;
use crate::types::WalkForwardResult;

pub trait ValidationMethod: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate decoded parameters over a table using this method. Never
    /// fails: unusable data yields a zero-valued result.
    fn validate(&self, params: &StrategyParams, table: &ReturnTable) -> WalkForwardResult;
}
