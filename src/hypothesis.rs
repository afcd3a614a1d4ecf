//! Human-readable labels for accepted alphas.
//!
//! Labels never influence evaluation or gating; they only name records.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hypothesis {
    pub name: String,
    pub description: String,
}

/// Source of hypothesis labels, e.g. a language-model client.
pub trait HypothesisSource: Send + Sync {
    /// Label for the `index`-th accepted alpha over `assets`. Runs sharing a
    /// registry continue the count from the records it already holds.
    fn hypothesis(&self, index: usize, assets: &[String]) -> Hypothesis;
}

const AGENTS: [&str; 5] = ["Researcher", "Coder", "Validator", "Simulator", "Mutator"];
const CHANNELS: [&str; 5] = [
    "order-flow proxy",
    "satellite activity",
    "dark-pool flow",
    "gamma cluster",
    "text sentiment",
];

/// Deterministic local labels built from the asset universe.
#[derive(Debug, Clone, Default)]
pub struct StaticHypotheses;

impl HypothesisSource for StaticHypotheses {
    fn hypothesis(&self, index: usize, assets: &[String]) -> Hypothesis {
        let agent = AGENTS[index % AGENTS.len()];
        let channel = CHANNELS[(index / AGENTS.len()) % CHANNELS.len()];
        let description = match assets.len() {
            0 => format!("{} hypothesis via {}", agent, channel),
            1 => format!("{} self-momentum via {}", assets[0], channel),
            n => {
                let cause = &assets[index % n];
                let effect = &assets[(index + 1) % n];
                format!("{} -> {} via {}", cause, effect, channel)
            }
        };
        Hypothesis {
            name: format!("EvoAlpha-{}-{}", agent, index + 1),
            description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_deterministic() {
        let assets = vec!["SPY".to_string(), "TLT".to_string(), "GLD".to_string()];
        let a = StaticHypotheses.hypothesis(1, &assets);
        assert_eq!(a, StaticHypotheses.hypothesis(1, &assets));
        assert_eq!(a.name, "EvoAlpha-Coder-2");
        assert_eq!(a.description, "TLT -> GLD via order-flow proxy");
        assert!(StaticHypotheses.hypothesis(0, &[]).description.contains("Researcher"));
    }
}
