pub mod evaluation;
pub mod fitness;
pub mod gate;
pub mod generation;
pub mod metrics;
pub mod validation;
