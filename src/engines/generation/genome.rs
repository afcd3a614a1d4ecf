use crate::config::GenomeConfig;
use crate::engines::evaluation::StrategyParams;
use crate::engines::fitness::{Evaluation, EvaluationMetrics, FitnessTuple};
use crate::engines::metrics::BehaviourFingerprint;
use crate::error::{EvoAlphaError, Result};
use serde::{Deserialize, Serialize};

/// Strategy genome: a fixed-length vector of bounded genes plus the result
/// of its last evaluation.
///
/// Genes are only reachable through methods that repair them into their
/// declared bounds, and every change clears the evaluation, so fitness,
/// metrics and fingerprint are always present or absent together and always
/// describe the current genes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    genes: Vec<f64>,
    evaluation: Option<Evaluation>,
}

impl Genome {
    /// Genome from raw values, each repaired into its gene's bounds.
    pub fn new(values: Vec<f64>, config: &GenomeConfig) -> Result<Self> {
        if values.len() != config.len() {
            return Err(EvoAlphaError::Configuration(format!(
                "genome has {} genes, configuration declares {}",
                values.len(),
                config.len()
            )));
        }
        Ok(Self::from_values(&values, config))
    }

    /// Repairs `values` gene by gene; the caller guarantees the length.
    pub(crate) fn from_values(values: &[f64], config: &GenomeConfig) -> Self {
        Self {
            genes: values
                .iter()
                .zip(&config.genes)
                .map(|(v, spec)| spec.repair(*v))
                .collect(),
            evaluation: None,
        }
    }

    pub fn genes(&self) -> &[f64] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Sets one gene (repaired into bounds). Clears the evaluation when the
    /// stored value changes.
    pub fn set_gene(&mut self, index: usize, value: f64, config: &GenomeConfig) {
        let (Some(gene), Some(spec)) = (self.genes.get_mut(index), config.genes.get(index)) else {
            return;
        };
        let repaired = spec.repair(value);
        if repaired != *gene {
            *gene = repaired;
            self.evaluation = None;
        }
    }

    pub fn decode(&self) -> Result<StrategyParams> {
        StrategyParams::decode(&self.genes)
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluation.is_some()
    }

    pub fn evaluation(&self) -> Option<&Evaluation> {
        self.evaluation.as_ref()
    }

    pub fn set_evaluation(&mut self, evaluation: Evaluation) {
        self.evaluation = Some(evaluation);
    }

    pub fn invalidate(&mut self) {
        self.evaluation = None;
    }

    pub fn fitness(&self) -> Option<&FitnessTuple> {
        self.evaluation.as_ref().map(|e| &e.fitness)
    }

    pub fn metrics(&self) -> Option<&EvaluationMetrics> {
        self.evaluation.as_ref().map(|e| &e.metrics)
    }

    pub fn fingerprint(&self) -> Option<&BehaviourFingerprint> {
        self.evaluation.as_ref().map(|e| &e.fingerprint)
    }

    /// Composite score; unevaluated genomes rank below everything.
    pub fn composite(&self) -> f64 {
        self.fitness().map_or(f64::NEG_INFINITY, |f| f.composite)
    }

    /// Canonical text of the genes, used for deduplication.
    pub fn signature(&self) -> String {
        self.genes
            .iter()
            .map(|g| format!("{:.6}", g))
            .collect::<Vec<_>>()
            .join("|")
    }
}
