use evoalpha::config::{AppConfig, FitnessWeights, GateConfig, SelectionMode};
use evoalpha::data::{MarketDataProvider, ReturnTable, StaticMarketData, SyntheticMarketData};
use evoalpha::engines::generation::{
    CancellationToken, ChannelProgressCallback, EvolutionRun, GenerationSummary, ProgressCallback,
    ProgressMessage,
};
use evoalpha::error::{EvoAlphaError, Result};
use evoalpha::hypothesis::StaticHypotheses;
use evoalpha::registry::{AlphaRegistry, EliteRecord, InMemoryRegistry, RegistryFilter};
use evoalpha::types::PerformanceSummary;
use std::collections::HashSet;
use std::sync::{mpsc, Mutex};

/// Simple progress callback for testing
#[derive(Default)]
struct TestProgressCallback {
    started: usize,
    completed: Vec<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl ProgressCallback for TestProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {
        self.started += 1;
    }

    fn on_population_evaluated(&mut self, _evaluated: usize, _total: usize) {}

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        self.completed.push(summary.generation);
        if let Some((generation, token)) = &self.cancel_after {
            if summary.generation == *generation {
                token.cancel();
            }
        }
    }
}

/// Registry that stores every record it is handed.
#[derive(Default)]
struct RecordingRegistry {
    records: Mutex<Vec<EliteRecord>>,
}

impl RecordingRegistry {
    fn names(&self) -> Vec<String> {
        self.records.lock().unwrap().iter().map(|r| r.name.clone()).collect()
    }
}

impl AlphaRegistry for RecordingRegistry {
    fn save(&self, record: &EliteRecord) -> bool {
        self.records.lock().unwrap().push(record.clone());
        true
    }

    fn top_n(&self, n: usize, _filter: &RegistryFilter) -> Vec<EliteRecord> {
        self.records.lock().unwrap().iter().take(n).cloned().collect()
    }

    fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

struct UnreachableFeed;

impl MarketDataProvider for UnreachableFeed {
    fn get_returns(&self, _period: usize) -> Result<ReturnTable> {
        Err(EvoAlphaError::DataUnavailable("feed offline".to_string()))
    }
}

/// Create a minimal config for fast testing
fn create_test_config(population: usize, generations: usize, seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.evolution.population_size = population;
    config.evolution.num_generations = generations;
    config.evolution.seed = Some(seed);
    config
}

fn market() -> SyntheticMarketData {
    SyntheticMarketData::new(2, 500, 11).unwrap()
}

#[test]
fn test_single_genome_always_pass_gate_produces_one_record() {
    let mut config = create_test_config(1, 1, 42);
    config.gate = GateConfig::always_pass();

    let mut run = EvolutionRun::new(config).unwrap();
    let registry = RecordingRegistry::default();
    let mut callback = TestProgressCallback::default();
    let report = run.run(&market(), Some(&registry), &StaticHypotheses, &mut callback);

    assert_eq!(report.generations_completed, 1);
    assert!(!report.cancelled);
    assert_eq!(report.accepted.len(), 1);
    assert_eq!(report.rejections.rejected, 0);
    assert_eq!(callback.completed, vec![0]);

    let record = &report.accepted[0];
    assert_eq!(record.id.len(), 12);
    assert_eq!(record.name, "EvoAlpha-Researcher-1");
    assert!(record.metrics_blob.get("genes").is_some());
    assert_eq!(report.saved, 1);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.names(), vec!["EvoAlpha-Researcher-1".to_string()]);
}

#[test]
fn test_qualifying_genomes_outside_hall_of_fame_are_recorded() {
    // Composite rewards low Sharpe while the gate only wants positive Sharpe,
    // so the single hall-of-fame slot never holds the genomes the gate accepts.
    let mut config = create_test_config(30, 4, 61);
    config.evolution.hall_of_fame_size = 1;
    config.fitness.weights = FitnessWeights {
        sharpe: -1.0,
        drawdown: 0.0,
        consistency: 0.0,
        novelty: 0.0,
        robustness: 0.0,
        overfit_penalty: 0.0,
    };
    config.gate = GateConfig {
        min_oos_sharpe: 0.0,
        ..GateConfig::always_pass()
    };

    let mut run = EvolutionRun::new(config).unwrap();
    let registry = InMemoryRegistry::new();
    let report = run.run(&market(), Some(&registry), &StaticHypotheses, &mut TestProgressCallback::default());

    assert_eq!(report.hall_of_fame.len(), 1);
    let hall_of_fame_signature = &report.hall_of_fame[0].signature;
    let accepted: HashSet<&str> = report.accepted.iter().map(|r| r.signature.as_str()).collect();
    assert_eq!(accepted.len(), report.accepted.len());

    assert!(!report.accepted.is_empty());
    assert!(report.accepted.iter().all(|r| r.composite_sharpe > 0.0));
    assert!(report.accepted.iter().any(|r| &r.signature != hall_of_fame_signature));
    assert_eq!(report.saved, report.accepted.len());
    assert_eq!(registry.len(), report.saved);

    for genome in run.population() {
        let sharpe = genome.metrics().unwrap().out_of_sample.sharpe;
        if sharpe > 0.0 {
            assert!(accepted.contains(genome.signature().as_str()), "qualifying genome was not recorded");
        }
    }
}

#[test]
fn test_record_names_continue_across_runs_sharing_a_registry() {
    let registry = RecordingRegistry::default();
    for seed in [1, 2] {
        let mut config = create_test_config(4, 1, seed);
        config.gate = GateConfig::always_pass();
        let mut run = EvolutionRun::new(config).unwrap();
        let report = run.run(&market(), Some(&registry), &StaticHypotheses, &mut TestProgressCallback::default());
        assert_eq!(report.saved, 4);
    }

    let names = registry.names();
    assert_eq!(names.len(), 8);
    let distinct: HashSet<&String> = names.iter().collect();
    assert_eq!(distinct.len(), 8);
    assert_eq!(names[4], "EvoAlpha-Mutator-5");
}

#[test]
fn test_empty_table_gives_zero_metrics_and_no_elites() {
    let provider = StaticMarketData::new(ReturnTable::empty());
    let mut run = EvolutionRun::new(create_test_config(8, 2, 3)).unwrap();
    let registry = InMemoryRegistry::new();
    let report = run.run(&provider, Some(&registry), &StaticHypotheses, &mut TestProgressCallback::default());

    assert!(report.data_error.as_deref().unwrap_or("").contains("Insufficient data"));
    for genome in run.population() {
        let evaluation = genome.evaluation().unwrap();
        assert_eq!(evaluation.metrics.out_of_sample, PerformanceSummary::default());
        assert_eq!(evaluation.metrics.in_sample, PerformanceSummary::default());
        assert_eq!(evaluation.metrics.diversity, 0.0);
        assert_eq!(evaluation.metrics.robustness, 0.0);
        assert_eq!(evaluation.fitness.composite, 0.0);
    }
    assert!(report.accepted.is_empty());
    assert_eq!(report.saved, 0);
    assert!(report.rejections.rejected > 0);
    assert!(registry.is_empty());
}

#[test]
fn test_unreachable_feed_is_reported_not_fatal() {
    let mut run = EvolutionRun::new(create_test_config(6, 2, 5)).unwrap();
    let report = run.run(&UnreachableFeed, None, &StaticHypotheses, &mut TestProgressCallback::default());

    assert_eq!(report.generations_completed, 2);
    assert!(report.data_error.as_deref().unwrap_or("").contains("feed offline"));
    assert!(report.accepted.is_empty());
}

#[test]
fn test_hall_of_fame_best_never_decreases() {
    let mut run = EvolutionRun::new(create_test_config(200, 50, 2024)).unwrap();
    let report = run.run(&market(), None, &StaticHypotheses, &mut TestProgressCallback::default());

    let best = report.best_history();
    assert_eq!(best.len(), 50);
    assert!(best.iter().all(|b| b.is_finite()));
    for pair in best.windows(2) {
        assert!(pair[1] >= pair[0], "hall of fame best dropped: {:?}", pair);
    }
    assert!(report.hall_of_fame.len() <= 5);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run_once = || {
        let mut run = EvolutionRun::new(create_test_config(16, 4, 77)).unwrap();
        run.run(&market(), None, &StaticHypotheses, &mut TestProgressCallback::default())
    };
    let first = run_once();
    let second = run_once();

    assert_eq!(first.history, second.history);
    let signatures = |report: &evoalpha::engines::generation::RunReport| {
        report.hall_of_fame.iter().map(|e| e.signature.clone()).collect::<Vec<_>>()
    };
    assert_eq!(signatures(&first), signatures(&second));
}

#[test]
fn test_cancellation_stops_after_current_generation() {
    let mut run = EvolutionRun::new(create_test_config(10, 6, 8)).unwrap();
    let mut callback = TestProgressCallback {
        cancel_after: Some((1, run.cancellation_token())),
        ..Default::default()
    };
    let report = run.run(&market(), None, &StaticHypotheses, &mut callback);

    assert!(report.cancelled);
    assert_eq!(report.generations_completed, 2);
    assert_eq!(callback.completed, vec![0, 1]);
    assert_eq!(report.history.len(), 2);
}

#[test]
fn test_cancelled_run_keeps_records_from_completed_generations() {
    let mut config = create_test_config(10, 6, 8);
    config.gate = GateConfig::always_pass();
    let mut run = EvolutionRun::new(config).unwrap();
    let mut callback = TestProgressCallback {
        cancel_after: Some((0, run.cancellation_token())),
        ..Default::default()
    };
    let registry = RecordingRegistry::default();
    let report = run.run(&market(), Some(&registry), &StaticHypotheses, &mut callback);

    assert!(report.cancelled);
    assert_eq!(report.generations_completed, 1);
    assert_eq!(report.accepted.len(), 10);
    assert_eq!(report.saved, 10);
    assert_eq!(registry.len(), 10);
}

#[test]
fn test_non_finite_returns_do_not_poison_evaluation() {
    let data = SyntheticMarketData::new(2, 600, 19).unwrap();
    let table = data.table().map_returns(|asset, row, r| {
        if asset == 0 && row % 97 == 0 {
            f64::NAN
        } else {
            r
        }
    });
    let provider = StaticMarketData::new(table);
    let mut run = EvolutionRun::new(create_test_config(8, 2, 23)).unwrap();
    let report = run.run(&provider, None, &StaticHypotheses, &mut TestProgressCallback::default());

    assert!(report.data_error.is_none());
    for genome in run.population() {
        let metrics = genome.metrics().unwrap();
        assert!(metrics.out_of_sample.sharpe.is_finite());
        assert!(metrics.out_of_sample.total_return.is_finite());
        assert_ne!(metrics.out_of_sample, PerformanceSummary::default());
    }
}

#[test]
fn test_channel_progress_messages() {
    let (sender, receiver) = mpsc::channel();
    let mut callback = ChannelProgressCallback::new(sender);
    let mut run = EvolutionRun::new(create_test_config(6, 3, 13)).unwrap();
    run.run(&market(), None, &StaticHypotheses, &mut callback);
    drop(callback);

    let messages: Vec<ProgressMessage> = receiver.iter().collect();
    assert_eq!(messages.len(), 9);
    assert_eq!(messages[0], ProgressMessage::GenerationStart(0));
    assert_eq!(
        messages[1],
        ProgressMessage::PopulationEvaluated { evaluated: 6, total: 6 }
    );
    match &messages[8] {
        ProgressMessage::GenerationComplete(summary) => assert_eq!(summary.generation, 2),
        other => panic!("unexpected message {:?}", other),
    }
}

#[test]
fn test_pareto_selection_mode_runs() {
    let mut config = create_test_config(20, 4, 21);
    config.evolution.selection_mode = SelectionMode::Pareto;
    let mut run = EvolutionRun::new(config).unwrap();
    let report = run.run(&market(), None, &StaticHypotheses, &mut TestProgressCallback::default());

    assert_eq!(report.generations_completed, 4);
    assert_eq!(run.population().len(), 20);
    assert!(!report.hall_of_fame.is_empty());
}

#[test]
fn test_archive_never_shrinks_within_run() {
    let mut run = EvolutionRun::new(create_test_config(30, 8, 99)).unwrap();
    let report = run.run(&market(), None, &StaticHypotheses, &mut TestProgressCallback::default());

    let sizes: Vec<usize> = report.history.iter().map(|s| s.archive_size).collect();
    for pair in sizes.windows(2) {
        assert!(pair[1] >= pair[0]);
    }
    assert_eq!(run.archive().len(), *sizes.last().unwrap());
}
