pub mod elite_gate;

pub use elite_gate::{EliteGate, GateCriterion, GateDecision, GateFailure, RejectionSummary};
