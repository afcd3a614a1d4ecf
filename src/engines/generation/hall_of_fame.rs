use crate::engines::generation::genome::Genome;

use std::collections::HashSet;

#[derive(Clone, Debug)]
pub struct EliteStrategy {
    pub genome: Genome,
    pub fitness: f64,       // Composite score
    pub signature: String,  // For deduplication
    pub generation: usize,  // Generation in which it was first seen
}

impl EliteStrategy {
    /// Entry for an evaluated genome; `None` when the genome has no fitness.
    pub fn from_genome(genome: &Genome, generation: usize) -> Option<Self> {
        let fitness = genome.fitness()?.composite;
        Some(Self {
            genome: genome.clone(),
            fitness,
            signature: genome.signature(),
            generation,
        })
    }
}

/// Best distinct genomes seen across a whole run.
pub struct HallOfFame {
    strategies: Vec<EliteStrategy>,
    max_size: usize,
    seen_signatures: HashSet<String>,
}

impl HallOfFame {
    pub fn new(max_size: usize) -> Self {
        Self {
            strategies: Vec::new(),
            max_size,
            seen_signatures: HashSet::new(),
        }
    }

    /// Attempt to add a strategy to the Hall of Fame
    pub fn try_add(&mut self, strategy: EliteStrategy) -> bool {
        // Deduplication check
        if self.seen_signatures.contains(&strategy.signature) || !strategy.fitness.is_finite() {
            return false;
        }
        if self.strategies.len() >= self.max_size
            && self
                .strategies
                .last()
                .is_some_and(|worst| worst.fitness >= strategy.fitness)
        {
            return false;
        }

        self.seen_signatures.insert(strategy.signature.clone());
        self.strategies.push(strategy);
        self.sort_and_trim();

        true
    }

    /// Offers every evaluated genome of a generation.
    pub fn update(&mut self, population: &[Genome], generation: usize) -> usize {
        population
            .iter()
            .filter_map(|g| EliteStrategy::from_genome(g, generation))
            .filter(|s| self.try_add(s.clone()))
            .count()
    }

    /// Sort by fitness (descending) and trim to max size
    fn sort_and_trim(&mut self) {
        self.strategies.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        while self.strategies.len() > self.max_size {
            if let Some(removed) = self.strategies.pop() {
                self.seen_signatures.remove(&removed.signature);
            }
        }
    }

    /// Get all elite strategies
    pub fn get_all(&self) -> &[EliteStrategy] {
        &self.strategies
    }

    /// Get top N strategies
    pub fn get_top_n(&self, n: usize) -> &[EliteStrategy] {
        &self.strategies[..n.min(self.strategies.len())]
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.strategies.first().map(|s| s.fitness)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenomeConfig;
    use crate::engines::fitness::{Evaluation, FitnessTuple};

    fn genome(first_gene: f64, composite: f64) -> Genome {
        let config = GenomeConfig::default();
        let mut g = Genome::new(vec![first_gene, 40.0, 0.01, 0.8, 20.0, 0.5, 0.5, 0.5], &config).unwrap();
        g.set_evaluation(Evaluation {
            fitness: FitnessTuple {
                composite,
                ..Default::default()
            },
            ..Default::default()
        });
        g
    }

    #[test]
    fn test_keeps_best_distinct() {
        let mut hof = HallOfFame::new(2);
        let population = vec![genome(2.0, 1.0), genome(3.0, 3.0), genome(4.0, 2.0), genome(3.0, 3.0)];
        assert_eq!(hof.update(&population, 0), 3);
        assert_eq!(hof.len(), 2);
        assert_eq!(hof.best_fitness(), Some(3.0));
        assert_eq!(hof.get_all()[1].fitness, 2.0);
        assert_eq!(hof.get_top_n(10).len(), 2);
    }

    #[test]
    fn test_rejects_worse_when_full_and_unevaluated() {
        let mut hof = HallOfFame::new(1);
        assert!(hof.try_add(EliteStrategy::from_genome(&genome(2.0, 5.0), 0).unwrap()));
        assert!(!hof.try_add(EliteStrategy::from_genome(&genome(3.0, 4.0), 1).unwrap()));
        let mut fresh = genome(5.0, 1.0);
        fresh.invalidate();
        assert!(EliteStrategy::from_genome(&fresh, 1).is_none());
        assert_eq!(hof.best_fitness(), Some(5.0));
    }
}
