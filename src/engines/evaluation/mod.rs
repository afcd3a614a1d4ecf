pub mod backtester;
pub mod costs;
pub mod signal;

pub use backtester::Backtester;
pub use costs::CostModel;
pub use signal::StrategyParams;
