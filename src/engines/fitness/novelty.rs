use crate::config::NoveltyConfig;
use crate::engines::metrics::{BehaviourFingerprint, FINGERPRINT_DIM};
use nalgebra::{DMatrix, DVector};

/// Distance between fingerprints, fixed for one generation.
#[derive(Debug, Clone)]
pub enum DistanceMetric {
    Euclidean,
    /// Inverse of the ridge-regularised archive covariance.
    Mahalanobis(DMatrix<f64>),
}

impl DistanceMetric {
    /// Mahalanobis once the archive is large enough to estimate a
    /// covariance, Euclidean otherwise or when the covariance is singular.
    pub fn fit(entries: &[BehaviourFingerprint], config: &NoveltyConfig) -> Self {
        if entries.len() < config.mahalanobis_min_archive.max(2) {
            return DistanceMetric::Euclidean;
        }
        let n = entries.len() as f64;
        let mut mean = DVector::zeros(FINGERPRINT_DIM);
        for fp in entries {
            mean += DVector::from_column_slice(fp.as_slice());
        }
        mean /= n;

        let mut cov = DMatrix::zeros(FINGERPRINT_DIM, FINGERPRINT_DIM);
        for fp in entries {
            let diff = DVector::from_column_slice(fp.as_slice()) - &mean;
            cov += &diff * diff.transpose();
        }
        cov /= n - 1.0;
        for i in 0..FINGERPRINT_DIM {
            cov[(i, i)] += config.covariance_ridge;
        }

        match cov.try_inverse() {
            Some(inverse) if inverse.iter().all(|v| v.is_finite()) => {
                DistanceMetric::Mahalanobis(inverse)
            }
            _ => {
                log::debug!("Archive covariance is singular, using Euclidean distance");
                DistanceMetric::Euclidean
            }
        }
    }

    pub fn distance(&self, a: &BehaviourFingerprint, b: &BehaviourFingerprint) -> f64 {
        match self {
            DistanceMetric::Euclidean => a.euclidean(b),
            DistanceMetric::Mahalanobis(inverse) => {
                let mut diff = [0.0; FINGERPRINT_DIM];
                for (d, (x, y)) in diff.iter_mut().zip(a.as_slice().iter().zip(b.as_slice())) {
                    *d = x - y;
                }
                let mut squared = 0.0;
                for i in 0..FINGERPRINT_DIM {
                    for j in 0..FINGERPRINT_DIM {
                        squared += diff[i] * inverse[(i, j)] * diff[j];
                    }
                }
                squared.max(0.0).sqrt()
            }
        }
    }
}

/// Growing set of behavioural fingerprints with a self-adjusting
/// acceptance threshold. One archive belongs to one evolutionary run.
#[derive(Debug, Clone)]
pub struct NoveltyArchive {
    config: NoveltyConfig,
    entries: Vec<BehaviourFingerprint>,
    threshold: f64,
    stalled: usize,
}

impl NoveltyArchive {
    pub fn new(config: NoveltyConfig) -> Self {
        let threshold = config.initial_threshold;
        Self {
            config,
            entries: Vec::new(),
            threshold,
            stalled: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn entries(&self) -> &[BehaviourFingerprint] {
        &self.entries
    }

    /// Mean distance from `population[index]` to its k nearest neighbours
    /// among the archive and the rest of the population. 0.0 without
    /// neighbours.
    pub fn novelty(
        &self,
        metric: &DistanceMetric,
        index: usize,
        population: &[BehaviourFingerprint],
    ) -> f64 {
        self.knn_novelty(metric, index, population, false)
    }

    fn knn_novelty(
        &self,
        metric: &DistanceMetric,
        index: usize,
        population: &[BehaviourFingerprint],
        skip_own_entry: bool,
    ) -> f64 {
        let Some(target) = population.get(index) else {
            return 0.0;
        };
        let own_entry = if skip_own_entry {
            self.entries.iter().position(|fp| fp == target)
        } else {
            None
        };
        let mut distances: Vec<f64> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != own_entry)
            .map(|(_, fp)| fp)
            .chain(
                population
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != index)
                    .map(|(_, fp)| fp),
            )
            .map(|fp| metric.distance(target, fp))
            .filter(|d| d.is_finite())
            .collect();
        if distances.is_empty() {
            return 0.0;
        }
        distances.sort_by(|a, b| a.total_cmp(b));
        let k = self.config.k_nearest.min(distances.len());
        distances[..k].iter().sum::<f64>() / k as f64
    }

    /// Novelty of individuals carried over from an earlier generation,
    /// against the archive as it stands now. Leaves the archive and the
    /// threshold untouched. An archived fingerprint does not count as its
    /// own neighbour.
    pub fn rescore(&self, population: &[BehaviourFingerprint], candidates: &[usize]) -> Vec<f64> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let metric = DistanceMetric::fit(&self.entries, &self.config);
        candidates
            .iter()
            .map(|&i| self.knn_novelty(&metric, i, population, true))
            .collect()
    }

    /// Scores `candidates` (indices into `population`) against the archive as
    /// it stood before this call, appends every candidate scoring above the
    /// current threshold, then adjusts the threshold. Returns one score per
    /// candidate.
    pub fn score_generation(
        &mut self,
        population: &[BehaviourFingerprint],
        candidates: &[usize],
    ) -> Vec<f64> {
        let metric = DistanceMetric::fit(&self.entries, &self.config);
        let scores: Vec<f64> = candidates
            .iter()
            .map(|&i| self.novelty(&metric, i, population))
            .collect();

        let mut added = 0;
        for (&i, &score) in candidates.iter().zip(&scores) {
            if score > self.threshold {
                if let Some(fp) = population.get(i) {
                    self.entries.push(*fp);
                    added += 1;
                }
            }
        }
        self.adjust_threshold(added);
        scores
    }

    fn adjust_threshold(&mut self, added: usize) {
        let step = self.config.threshold_step;
        if added > self.config.archive_add_high {
            self.threshold *= 1.0 + step;
            self.stalled = 0;
        } else if added == 0 {
            self.stalled += 1;
            if self.stalled >= self.config.stall_generations {
                self.threshold = (self.threshold * (1.0 - step)).max(self.config.min_threshold);
                self.stalled = 0;
            }
        } else {
            self.stalled = 0;
        }
    }
}

/// Maps a raw novelty distance to [0, 1).
pub fn diversity(novelty: f64) -> f64 {
    if novelty.is_finite() && novelty > 0.0 {
        novelty / (1.0 + novelty)
    } else {
        0.0
    }
}
