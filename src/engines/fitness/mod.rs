pub mod composite;
pub mod novelty;
pub mod pipeline;

pub use composite::{Evaluation, EvaluationMetrics, FitnessTuple};
pub use novelty::{DistanceMetric, NoveltyArchive};
pub use pipeline::{BehaviourEvaluation, FitnessPipeline, MarketSnapshot};
