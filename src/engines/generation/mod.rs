pub mod evolution_engine;
pub mod genome;
pub mod hall_of_fame;
pub mod operators;
pub mod optimisation;
pub mod pareto;
pub mod progress;

pub use evolution_engine::{
    CancellationToken, EvolutionRun, GenerationSummary, ProgressCallback, RunReport,
};
pub use genome::Genome;
pub use hall_of_fame::{EliteStrategy, HallOfFame};
pub use optimisation::{
    DataSplit, DataSplitter, SplitConfig, ValidationMethod, WalkForwardMethod, WalkForwardSplitter,
};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressMessage};
