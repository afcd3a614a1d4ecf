use crate::data::ReturnTable;
use crate::engines::evaluation::StrategyParams;
use crate::engines::generation::optimisation::WalkForwardMethod;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    pub passed: bool,
    pub score: f64,           // 0.0 to 1.0 (1.0 = perfect)
    pub details: serde_json::Value,
    pub interpretation: String,
}

pub trait RobustnessTest: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Run the robustness test against an out-of-sample table
    fn run(
        &self,
        params: &StrategyParams,
        table: &ReturnTable,
        method: &WalkForwardMethod,
    ) -> Result<TestResult>;
}
