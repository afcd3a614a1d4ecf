pub mod traits;
pub mod evolution;
pub mod genome;
pub mod backtesting;
pub mod fitness;
pub mod gate;
pub mod data;
pub mod registry;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, SelectionMode};
pub use genome::{GenomeConfig, GeneSpec, GeneKind};
pub use backtesting::BacktestingConfig;
pub use fitness::{FitnessConfig, FitnessWeights, NoveltyConfig, ShockScenario};
pub use gate::GateConfig;
pub use data::{DataConfig, DataSource};
pub use registry::RegistryConfig;
pub use traits::ConfigSection;
