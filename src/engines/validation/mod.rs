pub mod orchestrator;
pub mod robustness;

pub use orchestrator::{RobustnessReport, ValidationOrchestrator};
pub use robustness::{FrictionTest, RegimeShockTest, RobustnessTest, TestResult};
