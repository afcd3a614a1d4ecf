use crate::config::{AppConfig, SelectionMode};
use crate::data::MarketDataProvider;
use crate::engines::fitness::{BehaviourEvaluation, FitnessPipeline, MarketSnapshot, NoveltyArchive};
use crate::engines::gate::{elite_gate::record_id, EliteGate, RejectionSummary};
use crate::engines::generation::{
    genome::Genome,
    hall_of_fame::{EliteStrategy, HallOfFame},
    operators::*,
    pareto::rank_objectives,
};
use crate::engines::metrics::BehaviourFingerprint;
use crate::engines::validation::ValidationOrchestrator;
use crate::error::Result;
use crate::hypothesis::HypothesisSource;
use crate::registry::{AlphaRegistry, EliteRecord};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_population_evaluated(&mut self, evaluated: usize, total: usize);
    fn on_generation_complete(&mut self, summary: &GenerationSummary);
}

/// Cooperative stop signal, checked between generations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub generation: usize,
    /// Genomes (re-)evaluated in this generation.
    pub evaluated: usize,
    pub best_composite: f64,
    pub mean_composite: f64,
    /// Best composite in the hall of fame after this generation.
    pub hall_of_fame_best: f64,
    pub diversity: f64,
    pub archive_size: usize,
    pub novelty_threshold: f64,
    pub mutation_probability: f64,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub generations_completed: usize,
    pub cancelled: bool,
    pub history: Vec<GenerationSummary>,
    pub hall_of_fame: Vec<EliteStrategy>,
    /// Records that passed the Elite Gate, one per distinct genome.
    pub accepted: Vec<EliteRecord>,
    /// Accepted records the registry stored.
    pub saved: usize,
    /// Distinct genomes the gate turned down at least once.
    pub rejections: RejectionSummary,
    /// Market data failure at run start, if any.
    pub data_error: Option<String>,
}

impl RunReport {
    /// Hall-of-fame best composite after each completed generation.
    pub fn best_history(&self) -> Vec<f64> {
        self.history.iter().map(|s| s.hall_of_fame_best).collect()
    }
}

/// Where accepted genomes go while a run is in progress.
struct GateSink<'a> {
    registry: Option<&'a dyn AlphaRegistry>,
    hypotheses: &'a dyn HypothesisSource,
    orchestrator: ValidationOrchestrator,
    /// Records already in the registry when the run started; label
    /// numbering continues from there.
    label_offset: usize,
}

/// Gate outcomes collected over one run.
#[derive(Default)]
struct GateLedger {
    accepted: Vec<EliteRecord>,
    saved: usize,
    rejections: RejectionSummary,
    accepted_signatures: HashSet<String>,
    rejected_signatures: HashSet<String>,
}

/// One evolutionary run: configuration plus everything the run owns.
pub struct EvolutionRun {
    config: AppConfig,
    pipeline: FitnessPipeline,
    gate: EliteGate,
    population: Vec<Genome>,
    archive: NoveltyArchive,
    hall_of_fame: HallOfFame,
    history: Vec<GenerationSummary>,
    ledger: GateLedger,
    initial_diversity: Option<f64>,
    rng: StdRng,
    cancel: CancellationToken,
}

impl EvolutionRun {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.evolution.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            pipeline: FitnessPipeline::new(&config.backtesting, &config.fitness),
            gate: EliteGate::new(config.gate.clone()),
            population: Vec::new(),
            archive: NoveltyArchive::new(config.fitness.novelty.clone()),
            hall_of_fame: HallOfFame::new(config.evolution.hall_of_fame_size),
            history: Vec::new(),
            ledger: GateLedger::default(),
            initial_diversity: None,
            rng,
            cancel: CancellationToken::new(),
            config,
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    pub fn archive(&self) -> &NoveltyArchive {
        &self.archive
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Fetch data and evolve. Every generation, each evaluated genome goes
    /// through the Elite Gate and accepted records go to the registry right
    /// away; rejected genomes stay in the population. Never fails: data
    /// problems give zero-valued evaluations and are reported in
    /// `data_error`.
    pub fn run<C: ProgressCallback>(
        &mut self,
        provider: &dyn MarketDataProvider,
        registry: Option<&dyn AlphaRegistry>,
        hypotheses: &dyn HypothesisSource,
        callback: &mut C,
    ) -> RunReport {
        log::info!("Starting evolutionary run: {}", self.config.summary());

        let loaded = MarketSnapshot::load(provider, &self.config.backtesting)
            .and_then(|snapshot| snapshot.require_rows(self.config.data.min_rows));
        let (snapshot, data_error) = match loaded {
            Ok(snapshot) => {
                log::info!(
                    "Market data: {} assets, {} in-sample rows, {} out-of-sample rows",
                    snapshot.in_sample.n_assets(),
                    snapshot.in_sample.rows(),
                    snapshot.out_of_sample.rows()
                );
                (snapshot, None)
            }
            Err(e) => {
                log::error!("Market data unavailable, evaluating against empty tables: {}", e);
                (MarketSnapshot::empty(), Some(e.to_string()))
            }
        };
        let snapshot = Arc::new(snapshot);

        let sink = GateSink {
            registry,
            hypotheses,
            orchestrator: ValidationOrchestrator::new(&self.config.backtesting, &self.config.fitness),
            label_offset: registry.map_or(0, |r| r.len()),
        };
        let (generations_completed, cancelled) = self.evolve(&snapshot, &sink, callback);
        let GateLedger {
            accepted,
            saved,
            rejections,
            ..
        } = std::mem::take(&mut self.ledger);

        if rejections.rejected > 0 {
            log::info!("Elite Gate: {}", rejections.format_summary());
        }
        log::info!(
            "Run finished after {} generations: {} accepted, {} saved{}",
            generations_completed,
            accepted.len(),
            saved,
            if cancelled { " (cancelled)" } else { "" }
        );

        RunReport {
            generations_completed,
            cancelled,
            history: self.history.clone(),
            hall_of_fame: self.hall_of_fame.get_all().to_vec(),
            accepted,
            saved,
            rejections,
            data_error,
        }
    }

    /// Generational loop over a fixed snapshot. Returns the number of
    /// completed generations and whether the run was cancelled.
    fn evolve<C: ProgressCallback>(
        &mut self,
        snapshot: &Arc<MarketSnapshot>,
        sink: &GateSink<'_>,
        callback: &mut C,
    ) -> (usize, bool) {
        self.reset();
        let generations = self.config.evolution.num_generations;
        let mut completed = 0;

        // Initialize population
        self.population = (0..self.config.evolution.population_size)
            .map(|_| random_genome(&self.config.genome, &mut self.rng))
            .collect();

        // Evolution loop
        for generation in 0..generations {
            if self.cancel.is_cancelled() {
                log::warn!("Run cancelled before generation {}", generation + 1);
                return (completed, true);
            }
            callback.on_generation_start(generation);

            let evaluated = self.evaluate_pending(snapshot);
            callback.on_population_evaluated(evaluated, self.population.len());

            self.hall_of_fame.update(&self.population, generation);
            self.gate_population(snapshot, sink);

            let diversity = population_diversity(&self.population, &self.config.genome);
            let initial_diversity = *self.initial_diversity.get_or_insert(diversity);
            let summary = self.summarise(generation, evaluated, diversity);
            callback.on_generation_complete(&summary);
            self.history.push(summary);
            completed += 1;

            // Check termination
            if generation == generations - 1 {
                break;
            }
            if self.cancel.is_cancelled() {
                log::warn!("Cancellation requested, stopping after generation {}", generation + 1);
                return (completed, true);
            }

            // Create next generation
            self.population = self.create_next_generation(generation + 1, diversity, initial_diversity);
        }

        (completed, false)
    }

    fn reset(&mut self) {
        self.population.clear();
        self.archive = NoveltyArchive::new(self.config.fitness.novelty.clone());
        self.hall_of_fame = HallOfFame::new(self.config.evolution.hall_of_fame_size);
        self.history.clear();
        self.ledger = GateLedger::default();
        self.initial_diversity = None;
    }

    /// Evaluates every genome without a valid evaluation: backtests in
    /// parallel against the shared snapshot, then novelty and archive
    /// updates sequentially. Carried-over genomes keep their backtest but get
    /// a fresh novelty score against the current archive. Returns the number
    /// of genomes backtested.
    fn evaluate_pending(&mut self, snapshot: &Arc<MarketSnapshot>) -> usize {
        let (pending, carried): (Vec<usize>, Vec<usize>) =
            (0..self.population.len()).partition(|&i| !self.population[i].is_evaluated());

        let pipeline = &self.pipeline;
        let population = &self.population;
        let behaviours: Vec<BehaviourEvaluation> = pending
            .par_iter()
            .map(|&i| pipeline.evaluate_behaviour(population[i].genes(), snapshot))
            .collect();

        let mut fingerprints: Vec<BehaviourFingerprint> = self
            .population
            .iter()
            .map(|g| g.fingerprint().copied().unwrap_or_default())
            .collect();
        for (&i, behaviour) in pending.iter().zip(&behaviours) {
            fingerprints[i] = behaviour.fingerprint;
        }

        let refreshed = self.archive.rescore(&fingerprints, &carried);
        for (&i, score) in carried.iter().zip(refreshed) {
            if let Some(evaluation) = self.population[i].evaluation() {
                let evaluation = self.pipeline.rescore_novelty(evaluation, score);
                self.population[i].set_evaluation(evaluation);
            }
        }

        if pending.is_empty() {
            return 0;
        }
        let novelty = self.archive.score_generation(&fingerprints, &pending);
        for ((&i, behaviour), score) in pending.iter().zip(&behaviours).zip(novelty) {
            let evaluation = self.pipeline.score(behaviour, score);
            self.population[i].set_evaluation(evaluation);
        }

        pending.len()
    }

    fn summarise(&self, generation: usize, evaluated: usize, diversity: f64) -> GenerationSummary {
        let composites: Vec<f64> = self
            .population
            .iter()
            .map(Genome::composite)
            .filter(|c| c.is_finite())
            .collect();
        let best_composite = composites.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_composite = if composites.is_empty() {
            0.0
        } else {
            composites.iter().sum::<f64>() / composites.len() as f64
        };

        GenerationSummary {
            generation,
            evaluated,
            best_composite,
            mean_composite,
            hall_of_fame_best: self.hall_of_fame.best_fitness().unwrap_or(f64::NEG_INFINITY),
            diversity,
            archive_size: self.archive.len(),
            novelty_threshold: self.archive.threshold(),
            mutation_probability: self.config.evolution.mutation_probability(generation),
        }
    }

    fn create_next_generation(
        &mut self,
        generation: usize,
        diversity: f64,
        initial_diversity: f64,
    ) -> Vec<Genome> {
        let evolution = &self.config.evolution;
        let genome_config = &self.config.genome;
        let population = &self.population;
        let rng = &mut self.rng;

        // Elitism: copy top performers. They keep their backtest; novelty is
        // re-scored against the archive next generation.
        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| population[b].composite().total_cmp(&population[a].composite()));
        let mut next_generation: Vec<Genome> = order
            .iter()
            .take(evolution.elite_count())
            .map(|&i| population[i].clone())
            .collect();

        let ranking = match evolution.selection_mode {
            SelectionMode::Composite => None,
            SelectionMode::Pareto => Some(rank_objectives(
                &population
                    .iter()
                    .map(|g| g.fitness().map(|f| f.objectives()).unwrap_or_default())
                    .collect::<Vec<_>>(),
            )),
        };
        let select = |rng: &mut StdRng| match &ranking {
            Some(ranking) => pareto_tournament_selection(ranking, evolution.tournament_size, rng),
            None => tournament_selection(population, evolution.tournament_size, rng),
        };

        let scale = if initial_diversity > 0.0 {
            (diversity / initial_diversity).clamp(evolution.min_mutation_scale, 1.0)
        } else {
            1.0
        };
        let sigma = evolution.mutation_sigma * scale;
        let mutation_probability = evolution.mutation_probability(generation);

        // Generate offspring
        while next_generation.len() < evolution.population_size {
            if rng.gen::<f64>() < evolution.crossover_rate {
                let parent1 = select(&mut *rng);
                let parent2 = select(&mut *rng);
                let (mut child1, mut child2) = crossover(
                    &population[parent1],
                    &population[parent2],
                    evolution.crossover_noise,
                    genome_config,
                    rng,
                );

                // Apply mutation
                for child in [&mut child1, &mut child2] {
                    if rng.gen::<f64>() < mutation_probability {
                        mutate(child, evolution.gene_mutation_rate, sigma, genome_config, rng);
                    }
                }

                next_generation.push(child1);
                if next_generation.len() < evolution.population_size {
                    next_generation.push(child2);
                }
            } else {
                // Reproduction (copy); keeps its backtest unless mutated
                let mut child = population[select(&mut *rng)].clone();
                if rng.gen::<f64>() < mutation_probability {
                    mutate(&mut child, evolution.gene_mutation_rate, sigma, genome_config, rng);
                }
                next_generation.push(child);
            }
        }

        next_generation.truncate(evolution.population_size);
        next_generation
    }

    /// Runs the Elite Gate over every evaluated genome not yet accepted.
    /// Each distinct genome is recorded at most once; a rejected genome may
    /// still pass in a later generation once its novelty is re-scored.
    fn gate_population(&mut self, snapshot: &MarketSnapshot, sink: &GateSink<'_>) {
        for genome in &self.population {
            let Some(metrics) = genome.metrics() else {
                continue;
            };
            let signature = genome.signature();
            if self.ledger.accepted_signatures.contains(&signature) {
                continue;
            }

            let decision = self.gate.evaluate(metrics);
            if !decision.is_accepted() {
                if self.ledger.rejected_signatures.insert(signature.clone()) {
                    let reasons: Vec<String> = decision.failures().iter().map(|f| f.to_string()).collect();
                    log::debug!("Elite Gate rejected {}: {}", signature, reasons.join("; "));
                    self.ledger.rejections.record(&decision);
                }
                continue;
            }

            let sequence = sink.label_offset
                + if sink.registry.is_some() {
                    self.ledger.saved
                } else {
                    self.ledger.accepted.len()
                };
            let hypothesis = sink.hypotheses.hypothesis(sequence, snapshot.out_of_sample.assets());
            let created_at = Utc::now();
            let id = record_id(&signature, &hypothesis, created_at);
            let report = genome.decode().ok().and_then(|params| {
                sink.orchestrator
                    .run_robustness_report(&params, &snapshot.out_of_sample, id.clone())
                    .map_err(|e| log::debug!("No robustness report for {}: {}", id, e))
                    .ok()
            });

            let Some(record) = self
                .gate
                .build_record(genome, &hypothesis, report.as_ref(), created_at)
            else {
                continue;
            };
            log::info!(
                "Elite Gate accepted {} ({}): sharpe {:.3}, persistence {:.3}, diversity {:.3}",
                record.id,
                record.name,
                record.composite_sharpe,
                record.persistence_score,
                record.diversity
            );

            if let Some(registry) = sink.registry {
                if registry.save(&record) {
                    self.ledger.saved += 1;
                } else {
                    log::warn!("Registry did not store record {}", record.id);
                }
            }
            self.ledger.accepted_signatures.insert(signature);
            self.ledger.accepted.push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BacktestingConfig, GateConfig};
    use crate::data::SyntheticMarketData;
    use crate::engines::fitness::Evaluation;
    use crate::hypothesis::StaticHypotheses;
    use crate::registry::InMemoryRegistry;

    struct Silent;

    impl ProgressCallback for Silent {
        fn on_generation_start(&mut self, _generation: usize) {}
        fn on_population_evaluated(&mut self, _evaluated: usize, _total: usize) {}
        fn on_generation_complete(&mut self, _summary: &GenerationSummary) {}
    }

    fn small_config(seed: u64) -> AppConfig {
        let mut config = AppConfig::default();
        config.evolution.population_size = 12;
        config.evolution.num_generations = 3;
        config.evolution.seed = Some(seed);
        config
    }

    #[test]
    fn test_only_changed_genomes_are_reevaluated() {
        let provider = SyntheticMarketData::new(2, 300, 3).unwrap();
        let mut run = EvolutionRun::new(small_config(9)).unwrap();
        let registry = InMemoryRegistry::new();
        let report = run.run(&provider, Some(&registry), &StaticHypotheses, &mut Silent);

        assert_eq!(report.generations_completed, 3);
        assert_eq!(report.history[0].evaluated, 12);
        assert!(report.history[1].evaluated < 12);
        assert!(run.population().iter().all(Genome::is_evaluated));
        assert!(report.data_error.is_none());
    }

    #[test]
    fn test_carried_over_genomes_get_fresh_novelty() {
        let provider = SyntheticMarketData::new(2, 400, 3).unwrap();
        let snapshot = Arc::new(MarketSnapshot::load(&provider, &BacktestingConfig::default()).unwrap());
        let mut run = EvolutionRun::new(small_config(5)).unwrap();
        run.population = (0..8)
            .map(|_| random_genome(&run.config.genome, &mut run.rng))
            .collect();

        assert_eq!(run.evaluate_pending(&snapshot), 8);
        let first: Vec<Evaluation> = run.population.iter().filter_map(|g| g.evaluation().cloned()).collect();
        let fingerprints: Vec<BehaviourFingerprint> = first.iter().map(|e| e.fingerprint).collect();
        let all: Vec<usize> = (0..8).collect();
        let expected = run.archive.rescore(&fingerprints, &all);
        let archived = run.archive.len();

        assert_eq!(run.evaluate_pending(&snapshot), 0);
        assert_eq!(run.archive.len(), archived);
        for ((genome, before), novelty) in run.population.iter().zip(&first).zip(&expected) {
            let after = genome.evaluation().unwrap();
            assert_eq!(after.metrics.novelty, *novelty);
            assert_eq!(after.metrics.out_of_sample, before.metrics.out_of_sample);
            assert_eq!(after.fitness.sharpe, before.fitness.sharpe);
            assert_eq!(after.fitness.composite, after.fitness.composite_with(run.pipeline.weights()));
        }
    }

    #[test]
    fn test_cancel_before_start_runs_nothing() {
        let provider = SyntheticMarketData::new(2, 300, 3).unwrap();
        let mut config = small_config(4);
        config.gate = GateConfig::always_pass();
        let mut run = EvolutionRun::new(config).unwrap();
        run.cancellation_token().cancel();
        let report = run.run(&provider, None, &StaticHypotheses, &mut Silent);
        assert!(report.cancelled);
        assert_eq!(report.generations_completed, 0);
        assert!(report.accepted.is_empty());
    }
}
