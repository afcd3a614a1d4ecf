pub mod engine;
pub mod fingerprint;
pub mod profitability;
pub mod risk;

pub use engine::{MetricsEngine, WindowSeries};
pub use fingerprint::{BehaviourFingerprint, FINGERPRINT_DIM};
pub use profitability::ProfitabilityMetrics;
pub use risk::RiskMetrics;
