use crate::config::{GeneKind, GenomeConfig};
use crate::engines::generation::genome::Genome;
use crate::engines::generation::pareto::ParetoRank;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Generate random genome, uniform within each gene's bounds
pub fn random_genome<R: Rng>(config: &GenomeConfig, rng: &mut R) -> Genome {
    let values = config
        .genes
        .iter()
        .map(|spec| match spec.kind {
            GeneKind::Integer => rng.gen_range(spec.min.ceil() as i64..=spec.max.floor() as i64) as f64,
            GeneKind::Real => rng.gen_range(spec.min..=spec.max),
        })
        .collect::<Vec<f64>>();
    Genome::from_values(&values, config)
}

/// Tournament selection: index of the best composite among K random picks
pub fn tournament_selection<R: Rng>(
    population: &[Genome],
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());
    let mut best_fitness = population[best_idx].composite();

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..population.len());
        if population[idx].composite() > best_fitness {
            best_idx = idx;
            best_fitness = population[idx].composite();
        }
    }

    best_idx
}

/// Tournament on Pareto rank: lower front wins, ties go to the larger
/// crowding distance
pub fn pareto_tournament_selection<R: Rng>(
    ranking: &[ParetoRank],
    tournament_size: usize,
    rng: &mut R,
) -> usize {
    let mut best_idx = rng.gen_range(0..ranking.len());

    for _ in 1..tournament_size {
        let idx = rng.gen_range(0..ranking.len());
        if ranking[idx].beats(&ranking[best_idx]) {
            best_idx = idx;
        }
    }

    best_idx
}

/// Mixing ratio favouring the fitter parent. Scores are shifted so the worse
/// parent sits at 1.0; equal or unknown fitness gives 0.5.
pub fn blend_ratio(fitness1: f64, fitness2: f64) -> f64 {
    if !fitness1.is_finite() || !fitness2.is_finite() {
        return 0.5;
    }
    let floor = fitness1.min(fitness2) - 1.0;
    let (w1, w2) = (fitness1 - floor, fitness2 - floor);
    let alpha = w1 / (w1 + w2);
    if alpha.is_finite() {
        alpha
    } else {
        0.5
    }
}

/// Fitness-weighted blend crossover with Gaussian noise, repaired into
/// bounds. Children start unevaluated.
pub fn crossover<R: Rng>(
    parent1: &Genome,
    parent2: &Genome,
    noise: f64,
    config: &GenomeConfig,
    rng: &mut R,
) -> (Genome, Genome) {
    let alpha = blend_ratio(parent1.composite(), parent2.composite());
    let mut child1 = parent1.clone();
    let mut child2 = parent2.clone();
    child1.invalidate();
    child2.invalidate();

    for (i, spec) in config.genes.iter().enumerate() {
        let (Some(&a), Some(&b)) = (parent1.genes().get(i), parent2.genes().get(i)) else {
            continue;
        };
        let (jitter1, jitter2) = match Normal::new(0.0, (noise * spec.range()).max(f64::MIN_POSITIVE)) {
            Ok(normal) => (normal.sample(rng), normal.sample(rng)),
            Err(_) => (0.0, 0.0),
        };
        let first = alpha * a + (1.0 - alpha) * b + jitter1;
        let second = (1.0 - alpha) * a + alpha * b + jitter2;
        child1.set_gene(i, first, config);
        child2.set_gene(i, second, config);
    }

    (child1, child2)
}

/// Gaussian mutation. Each gene mutates with probability `gene_rate`, at
/// least one always does; step size is `sigma` times the gene's range.
pub fn mutate<R: Rng>(
    genome: &mut Genome,
    gene_rate: f64,
    sigma: f64,
    config: &GenomeConfig,
    rng: &mut R,
) {
    if genome.is_empty() {
        return;
    }
    let mut chosen: Vec<usize> = (0..genome.len())
        .filter(|_| rng.gen::<f64>() < gene_rate)
        .collect();
    if chosen.is_empty() {
        chosen.push(rng.gen_range(0..genome.len()));
    }

    for i in chosen {
        let Some(spec) = config.genes.get(i) else {
            continue;
        };
        let Ok(step) = Normal::new(0.0, (sigma * spec.range()).max(f64::MIN_POSITIVE)) else {
            continue;
        };
        let value = genome.genes()[i] + step.sample(rng);
        genome.set_gene(i, value, config);
    }
    genome.invalidate();
}

/// Mean distance of the range-normalised gene vectors to their centroid.
pub fn population_diversity(population: &[Genome], config: &GenomeConfig) -> f64 {
    if population.len() < 2 {
        return 0.0;
    }
    let normalised: Vec<Vec<f64>> = population
        .iter()
        .map(|g| {
            g.genes()
                .iter()
                .zip(&config.genes)
                .map(|(v, spec)| (v - spec.min) / spec.range())
                .collect()
        })
        .collect();

    let dims = config.len();
    let mut centroid = vec![0.0; dims];
    for genes in &normalised {
        for (c, v) in centroid.iter_mut().zip(genes) {
            *c += v;
        }
    }
    for c in centroid.iter_mut() {
        *c /= normalised.len() as f64;
    }

    normalised
        .iter()
        .map(|genes| {
            genes
                .iter()
                .zip(&centroid)
                .map(|(v, c)| (v - c).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .sum::<f64>()
        / normalised.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::fitness::{Evaluation, FitnessTuple};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> GenomeConfig {
        GenomeConfig::default()
    }

    fn scored(composite: f64, rng: &mut StdRng) -> Genome {
        let mut g = random_genome(&config(), rng);
        g.set_evaluation(Evaluation {
            fitness: FitnessTuple {
                composite,
                ..Default::default()
            },
            ..Default::default()
        });
        g
    }

    fn in_bounds(g: &Genome) -> bool {
        g.genes()
            .iter()
            .zip(&config().genes)
            .all(|(v, spec)| spec.contains(*v))
    }

    #[test]
    fn test_random_genomes_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..50 {
            let g = random_genome(&config(), &mut rng);
            assert_eq!(g.len(), 8);
            assert!(in_bounds(&g));
            assert!(!g.is_evaluated());
        }
    }

    #[test]
    fn test_tournament_prefers_fitter() {
        let mut rng = StdRng::seed_from_u64(2);
        let population: Vec<Genome> = (0..5).map(|i| scored(i as f64, &mut rng)).collect();
        let idx = tournament_selection(&population, 50, &mut rng);
        assert_eq!(idx, 4);
    }

    #[test]
    fn test_pareto_tournament_prefers_front() {
        let mut rng = StdRng::seed_from_u64(3);
        let ranking: Vec<ParetoRank> = [(2, 1.0), (0, 0.5), (0, 2.0), (1, f64::INFINITY)]
            .iter()
            .map(|&(front, crowding)| ParetoRank { front, crowding })
            .collect();
        assert_eq!(pareto_tournament_selection(&ranking, 64, &mut rng), 2);
    }

    #[test]
    fn test_blend_ratio() {
        assert_eq!(blend_ratio(1.0, 1.0), 0.5);
        assert!((blend_ratio(2.0, 1.0) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(blend_ratio(f64::NEG_INFINITY, 1.0), 0.5);
    }

    #[test]
    fn test_variation_keeps_bounds_and_invalidates() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let p1 = scored(1.0, &mut rng);
            let p2 = scored(3.0, &mut rng);
            let (mut c1, c2) = crossover(&p1, &p2, 0.5, &config(), &mut rng);
            assert!(in_bounds(&c1) && in_bounds(&c2));
            assert!(!c1.is_evaluated() && !c2.is_evaluated());

            mutate(&mut c1, 0.5, 2.0, &config(), &mut rng);
            assert!(in_bounds(&c1));
        }
    }

    #[test]
    fn test_mutation_changes_a_gene() {
        let mut rng = StdRng::seed_from_u64(5);
        let original = scored(1.0, &mut rng);
        let mut changed = 0;
        for _ in 0..20 {
            let mut g = original.clone();
            mutate(&mut g, 0.0, 0.2, &config(), &mut rng);
            assert!(!g.is_evaluated());
            if g.genes() != original.genes() {
                changed += 1;
            }
        }
        assert!(changed > 10);
    }

    #[test]
    fn test_diversity_of_identical_population_is_zero() {
        let mut rng = StdRng::seed_from_u64(6);
        let g = random_genome(&config(), &mut rng);
        assert_eq!(population_diversity(&vec![g.clone(); 5], &config()), 0.0);
        let mixed: Vec<Genome> = (0..20).map(|_| random_genome(&config(), &mut rng)).collect();
        assert!(population_diversity(&mixed, &config()) > 0.1);
    }
}
