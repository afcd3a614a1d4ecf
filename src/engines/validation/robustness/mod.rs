pub mod base;
pub mod friction;
pub mod regime_shock;

pub use base::{RobustnessTest, TestResult};
pub use friction::FrictionTest;
pub use regime_shock::RegimeShockTest;
