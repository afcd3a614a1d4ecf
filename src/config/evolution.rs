use super::traits::{check_probability, ConfigSection};
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub num_generations: usize,
    /// Fraction of the population copied unmodified into the next generation.
    pub elite_fraction: f64,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    /// Std-dev of the blend noise, as a fraction of each gene's range.
    pub crossover_noise: f64,
    /// Per-offspring mutation probability at generation zero.
    pub mutation_rate: f64,
    /// Share of `mutation_rate` still applied in the last generation.
    pub mutation_anneal_floor: f64,
    /// Per-gene perturbation probability once an offspring is picked for mutation.
    pub gene_mutation_rate: f64,
    /// Gaussian step, as a fraction of each gene's range, at full diversity.
    pub mutation_sigma: f64,
    /// Lower bound on the diversity-driven step scale.
    pub min_mutation_scale: f64,
    pub hall_of_fame_size: usize,
    pub selection_mode: SelectionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Tournament on the weighted composite score.
    Composite,
    /// Tournament on Pareto rank, then crowding distance.
    Pareto,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 200,
            num_generations: 40,
            elite_fraction: 0.05,
            tournament_size: 6,
            crossover_rate: 0.8,
            crossover_noise: 0.02,
            mutation_rate: 0.45,
            mutation_anneal_floor: 0.45,
            gene_mutation_rate: 0.35,
            mutation_sigma: 0.1,
            min_mutation_scale: 0.1,
            hall_of_fame_size: 5,
            selection_mode: SelectionMode::Composite,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Number of individuals carried over unchanged each generation.
    pub fn elite_count(&self) -> usize {
        let count = (self.population_size as f64 * self.elite_fraction).round() as usize;
        count.clamp(1, self.population_size.max(1))
    }

    /// Linearly annealed per-offspring mutation probability.
    pub fn mutation_probability(&self, generation: usize) -> f64 {
        if self.num_generations <= 1 {
            return self.mutation_rate;
        }
        let progress = generation as f64 / (self.num_generations - 1) as f64;
        let scale = 1.0 - (1.0 - self.mutation_anneal_floor) * progress.min(1.0);
        self.mutation_rate * scale
    }
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        if self.population_size == 0 {
            return Err(EvoAlphaError::Configuration(
                "Population size must be at least 1".to_string(),
            ));
        }
        if self.num_generations == 0 {
            return Err(EvoAlphaError::Configuration(
                "Generation count must be at least 1".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(EvoAlphaError::Configuration(
                "Tournament size must be at least 1".to_string(),
            ));
        }
        if self.hall_of_fame_size == 0 {
            return Err(EvoAlphaError::Configuration(
                "Hall of fame size must be at least 1".to_string(),
            ));
        }
        check_probability("Elite fraction", self.elite_fraction)?;
        check_probability("Crossover rate", self.crossover_rate)?;
        check_probability("Mutation rate", self.mutation_rate)?;
        check_probability("Mutation anneal floor", self.mutation_anneal_floor)?;
        check_probability("Gene mutation rate", self.gene_mutation_rate)?;
        if self.mutation_sigma <= 0.0 || self.crossover_noise < 0.0 {
            return Err(EvoAlphaError::Configuration(
                "Mutation sigma must be positive and crossover noise non-negative".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_mutation_scale) {
            return Err(EvoAlphaError::Configuration(
                "Minimum mutation scale must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_probability_anneals() {
        let config = EvolutionConfig::default();
        let first = config.mutation_probability(0);
        let last = config.mutation_probability(config.num_generations - 1);
        assert!((first - 0.45).abs() < 1e-12);
        assert!((last - 0.45 * 0.45).abs() < 1e-12);
        assert!(config.mutation_probability(10) < first);
    }

    #[test]
    fn test_elite_count_never_zero() {
        let config = EvolutionConfig {
            population_size: 1,
            ..Default::default()
        };
        assert_eq!(config.elite_count(), 1);
        assert_eq!(EvolutionConfig::default().elite_count(), 10);
    }

    #[test]
    fn test_rejects_bad_rates() {
        let config = EvolutionConfig {
            crossover_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
