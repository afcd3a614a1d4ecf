use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

/// Number of leading genes that encode the signal rule. Every gene after
/// these is an asset-weight gene.
pub const RULE_GENE_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneKind {
    Integer,
    Real,
}

/// Declared domain of one gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneSpec {
    pub name: String,
    pub kind: GeneKind,
    pub min: f64,
    pub max: f64,
}

impl GeneSpec {
    pub fn integer(name: &str, min: f64, max: f64) -> Self {
        Self { name: name.to_string(), kind: GeneKind::Integer, min, max }
    }

    pub fn real(name: &str, min: f64, max: f64) -> Self {
        Self { name: name.to_string(), kind: GeneKind::Real, min, max }
    }

    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Clamp into bounds and snap integer genes to whole numbers.
    pub fn repair(&self, value: f64) -> f64 {
        let value = if value.is_finite() { value } else { self.min };
        let clamped = value.clamp(self.min, self.max);
        match self.kind {
            GeneKind::Integer => clamped.round().clamp(self.min.ceil(), self.max.floor()),
            GeneKind::Real => clamped,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let in_range = value >= self.min && value <= self.max;
        match self.kind {
            GeneKind::Integer => in_range && value.fract() == 0.0,
            GeneKind::Real => in_range,
        }
    }
}

/// Layout of the strategy genome: five rule genes followed by asset weights.
///
/// Gene order is positional:
/// 0. fast moving-average window
/// 1. slow moving-average window
/// 2. momentum threshold
/// 3. volatility-percentile filter
/// 4. volatility lookback window
/// 5.. asset weights (cycled over the available assets)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenomeConfig {
    pub genes: Vec<GeneSpec>,
}

impl Default for GenomeConfig {
    fn default() -> Self {
        Self {
            genes: vec![
                GeneSpec::integer("fast_window", 2.0, 30.0),
                GeneSpec::integer("slow_window", 10.0, 120.0),
                GeneSpec::real("momentum_threshold", 0.0, 0.02),
                GeneSpec::real("volatility_filter", 0.5, 1.0),
                GeneSpec::integer("volatility_lookback", 5.0, 60.0),
                GeneSpec::real("weight_0", 0.0, 1.0),
                GeneSpec::real("weight_1", 0.0, 1.0),
                GeneSpec::real("weight_2", 0.0, 1.0),
            ],
        }
    }
}

impl GenomeConfig {
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn weight_gene_count(&self) -> usize {
        self.genes.len().saturating_sub(RULE_GENE_COUNT)
    }
}

impl ConfigSection for GenomeConfig {
    fn section_name() -> &'static str {
        "genome"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        if self.genes.len() <= RULE_GENE_COUNT {
            return Err(EvoAlphaError::Configuration(format!(
                "Genome needs {} rule genes plus at least one weight gene, got {} genes",
                RULE_GENE_COUNT,
                self.genes.len()
            )));
        }
        for gene in &self.genes {
            if !(gene.min.is_finite() && gene.max.is_finite()) || gene.min >= gene.max {
                return Err(EvoAlphaError::Configuration(format!(
                    "Gene '{}' has invalid bounds [{}, {}]",
                    gene.name, gene.min, gene.max
                )));
            }
            if gene.kind == GeneKind::Integer && gene.min.ceil() > gene.max.floor() {
                return Err(EvoAlphaError::Configuration(format!(
                    "Integer gene '{}' has no whole number in its bounds",
                    gene.name
                )));
            }
        }
        for window in [0, 1, 4] {
            let gene = &self.genes[window];
            if gene.kind != GeneKind::Integer || gene.min < 1.0 {
                return Err(EvoAlphaError::Configuration(format!(
                    "Window gene '{}' must be an integer gene with min >= 1",
                    gene.name
                )));
            }
        }
        if self.genes[RULE_GENE_COUNT..].iter().any(|g| g.min < 0.0) {
            return Err(EvoAlphaError::Configuration(
                "Asset weight genes must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
