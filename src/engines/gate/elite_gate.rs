use crate::config::GateConfig;
use crate::engines::fitness::EvaluationMetrics;
use crate::engines::generation::Genome;
use crate::engines::validation::RobustnessReport;
use crate::hypothesis::Hypothesis;
use crate::registry::EliteRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Hex characters kept from the record hash.
const ID_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateCriterion {
    OosSharpe,
    Persistence,
    Consistency,
    Diversity,
    Drawdown,
}

impl fmt::Display for GateCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GateCriterion::OosSharpe => "oos_sharpe",
            GateCriterion::Persistence => "persistence",
            GateCriterion::Consistency => "consistency",
            GateCriterion::Diversity => "diversity",
            GateCriterion::Drawdown => "drawdown",
        };
        f.write_str(name)
    }
}

/// One violated threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateFailure {
    pub criterion: GateCriterion,
    pub observed: f64,
    pub threshold: f64,
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let relation = match self.criterion {
            GateCriterion::Drawdown => "<=",
            _ => ">",
        };
        write!(
            f,
            "{} {:.4} (needs {} {:.4})",
            self.criterion, self.observed, relation, self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateDecision {
    Accepted,
    /// Every failed criterion, in a fixed order.
    Rejected(Vec<GateFailure>),
}

impl GateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted)
    }

    pub fn failures(&self) -> &[GateFailure] {
        match self {
            GateDecision::Accepted => &[],
            GateDecision::Rejected(failures) => failures,
        }
    }
}

/// Rejection counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejectionSummary {
    pub rejected: usize,
    pub by_criterion: BTreeMap<GateCriterion, usize>,
}

impl RejectionSummary {
    pub fn record(&mut self, decision: &GateDecision) {
        if decision.is_accepted() {
            return;
        }
        self.rejected += 1;
        for failure in decision.failures() {
            *self.by_criterion.entry(failure.criterion).or_insert(0) += 1;
        }
    }

    pub fn format_summary(&self) -> String {
        if self.rejected == 0 {
            return "no rejections".to_string();
        }
        let parts: Vec<String> = self
            .by_criterion
            .iter()
            .map(|(criterion, count)| format!("{criterion}: {count}"))
            .collect();
        format!("{} rejected ({})", self.rejected, parts.join(", "))
    }
}

/// Fixed-threshold acceptance check for evaluated genomes.
#[derive(Debug, Clone)]
pub struct EliteGate {
    config: GateConfig,
}

impl EliteGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Pure function of `metrics` and the thresholds.
    pub fn evaluate(&self, metrics: &EvaluationMetrics) -> GateDecision {
        let oos = &metrics.out_of_sample;
        let c = &self.config;
        let checks = [
            (GateCriterion::OosSharpe, oos.sharpe, c.min_oos_sharpe, oos.sharpe > c.min_oos_sharpe),
            (
                GateCriterion::Persistence,
                oos.persistence,
                c.min_persistence,
                oos.persistence > c.min_persistence,
            ),
            (
                GateCriterion::Consistency,
                oos.consistency,
                c.min_consistency,
                oos.consistency > c.min_consistency,
            ),
            (
                GateCriterion::Diversity,
                metrics.diversity,
                c.min_diversity,
                metrics.diversity > c.min_diversity,
            ),
            (
                GateCriterion::Drawdown,
                oos.max_drawdown.abs(),
                c.max_drawdown,
                oos.max_drawdown.abs() <= c.max_drawdown,
            ),
        ];

        let failures: Vec<GateFailure> = checks
            .iter()
            .filter(|(_, _, _, passed)| !passed)
            .map(|&(criterion, observed, threshold, _)| GateFailure {
                criterion,
                observed,
                threshold,
            })
            .collect();

        if failures.is_empty() {
            GateDecision::Accepted
        } else {
            GateDecision::Rejected(failures)
        }
    }

    /// Record for an accepted genome. `None` if the genome is unevaluated.
    pub fn build_record(
        &self,
        genome: &Genome,
        hypothesis: &Hypothesis,
        report: Option<&RobustnessReport>,
        created_at: DateTime<Utc>,
    ) -> Option<EliteRecord> {
        let evaluation = genome.evaluation()?;
        let metrics = &evaluation.metrics;
        let signature = genome.signature();
        let id = record_id(&signature, hypothesis, created_at);

        let metrics_blob = json!({
            "genes": genome.genes(),
            "fitness": evaluation.fitness,
            "metrics": metrics,
            "fingerprint": evaluation.fingerprint,
            "robustness_report": report,
            "gate": self.config,
        });

        Some(EliteRecord {
            id,
            name: hypothesis.name.clone(),
            description: hypothesis.description.clone(),
            composite_sharpe: metrics.out_of_sample.sharpe,
            persistence_score: metrics.out_of_sample.persistence,
            diversity: metrics.diversity,
            consistency: metrics.out_of_sample.consistency,
            created_at,
            metrics_blob,
            signature,
        })
    }
}

/// First hex characters of SHA-256 over the genome signature, labels and
/// timestamp.
pub fn record_id(signature: &str, hypothesis: &Hypothesis, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(signature.as_bytes());
    hasher.update(hypothesis.name.as_bytes());
    hasher.update(hypothesis.description.as_bytes());
    hasher.update(created_at.to_rfc3339().as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_LEN);
    id
}
