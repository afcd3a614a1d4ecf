//! Alpha registry: append-only store of accepted elite records.

pub mod jsonl;
pub mod memory;
pub mod record;

pub use jsonl::JsonlRegistry;
pub use memory::InMemoryRegistry;
pub use record::EliteRecord;

use crate::config::registry::MAX_AGE_DAYS;
use crate::config::RegistryConfig;
use chrono::{DateTime, Duration, Utc};

/// Write/query contract of an alpha registry.
pub trait AlphaRegistry: Send + Sync {
    /// Persists `record`. Returns `false` for duplicates, records failing the
    /// sanity check, or storage failures; never panics.
    fn save(&self, record: &EliteRecord) -> bool;

    /// Best `n` records passing `filter`, ordered by ranking score.
    fn top_n(&self, n: usize, filter: &RegistryFilter) -> Vec<EliteRecord>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Query filters for `top_n`. Bars are strict minimums.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryFilter {
    pub min_sharpe: f64,
    pub min_persistence: f64,
    pub min_diversity: f64,
    pub max_age: Option<Duration>,
}

impl RegistryFilter {
    /// Filter that lets every record through.
    pub fn none() -> Self {
        Self {
            min_sharpe: f64::NEG_INFINITY,
            min_persistence: f64::NEG_INFINITY,
            min_diversity: f64::NEG_INFINITY,
            max_age: None,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self {
            min_sharpe: config.min_sharpe,
            min_persistence: config.min_persistence,
            min_diversity: config.min_diversity,
            max_age: Some(Duration::days(config.max_age_days.clamp(0, MAX_AGE_DAYS))),
        }
    }

    pub fn matches(&self, record: &EliteRecord, now: DateTime<Utc>) -> bool {
        record.composite_sharpe > self.min_sharpe
            && record.persistence_score > self.min_persistence
            && record.diversity > self.min_diversity
            && self.max_age.map_or(true, |age| {
                now.checked_sub_signed(age)
                    .map_or(true, |cutoff| record.created_at >= cutoff)
            })
    }
}

impl Default for RegistryFilter {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default())
    }
}

/// Shared `top_n` selection over an in-memory record list.
pub(crate) fn select_top(records: &[EliteRecord], n: usize, filter: &RegistryFilter) -> Vec<EliteRecord> {
    let now = Utc::now();
    let mut selected: Vec<EliteRecord> = records
        .iter()
        .filter(|r| filter.matches(r, now))
        .cloned()
        .collect();
    selected.sort_by(|a, b| b.ranking_score().total_cmp(&a.ranking_score()));
    selected.truncate(n);
    selected
}

/// Duplicate check shared by registries: same id or same genome signature.
pub(crate) fn is_duplicate(records: &[EliteRecord], record: &EliteRecord) -> bool {
    records
        .iter()
        .any(|r| r.id == record.id || (!record.signature.is_empty() && r.signature == record.signature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_age_window_is_capped() {
        let config = RegistryConfig {
            max_age_days: i64::MAX,
            ..Default::default()
        };
        let filter = RegistryFilter::from_config(&config);
        assert_eq!(filter.max_age, Some(Duration::days(MAX_AGE_DAYS)));

        let record = EliteRecord {
            id: "a".to_string(),
            name: "alpha".to_string(),
            description: "test".to_string(),
            composite_sharpe: 5.0,
            persistence_score: 0.9,
            diversity: 0.7,
            consistency: 0.6,
            created_at: Utc::now(),
            metrics_blob: serde_json::json!({}),
            signature: "sig".to_string(),
        };
        assert!(filter.matches(&record, Utc::now()));
    }
}
