use super::evolution_engine::{GenerationSummary, ProgressCallback};
use std::sync::mpsc::Sender;

/// Reports progress through the `log` facade.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Generation {} starting...", generation + 1);
    }

    fn on_population_evaluated(&mut self, evaluated: usize, total: usize) {
        log::debug!("  Evaluated {}/{} genomes", evaluated, total);
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        log::info!(
            "Generation {} complete. Best: {:.4}, mean: {:.4}, hall of fame best: {:.4}, diversity: {:.3}, archive: {} (threshold {:.4}), mutation p: {:.3}",
            summary.generation + 1,
            summary.best_composite,
            summary.mean_composite,
            summary.hall_of_fame_best,
            summary.diversity,
            summary.archive_size,
            summary.novelty_threshold,
            summary.mutation_probability,
        );
    }
}

// For handing progress to another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    PopulationEvaluated { evaluated: usize, total: usize },
    GenerationComplete(GenerationSummary),
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_population_evaluated(&mut self, evaluated: usize, total: usize) {
        let _ = self
            .sender
            .send(ProgressMessage::PopulationEvaluated { evaluated, total });
    }

    fn on_generation_complete(&mut self, summary: &GenerationSummary) {
        let _ = self
            .sender
            .send(ProgressMessage::GenerationComplete(summary.clone()));
    }
}
