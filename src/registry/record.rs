use crate::error::{EvoAlphaError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Accepted alpha as written to the registry. Immutable once saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EliteRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Out-of-sample Sharpe ratio.
    pub composite_sharpe: f64,
    pub persistence_score: f64,
    pub diversity: f64,
    pub consistency: f64,
    pub created_at: DateTime<Utc>,
    /// Full evaluation, genes and robustness report.
    pub metrics_blob: serde_json::Value,
    /// Gene signature of the genome behind the record.
    pub signature: String,
}

impl EliteRecord {
    /// Ordering key for `top_n` queries.
    pub fn ranking_score(&self) -> f64 {
        0.4 * self.composite_sharpe
            + 0.3 * self.persistence_score
            + 0.2 * self.diversity
            + 0.1 * self.consistency
    }

    /// Checks every registry applies before accepting a record.
    pub fn sanity_check(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(EvoAlphaError::Registry("record id is empty".to_string()));
        }
        let scores = [
            self.composite_sharpe,
            self.persistence_score,
            self.diversity,
            self.consistency,
        ];
        if scores.iter().any(|v| !v.is_finite()) {
            return Err(EvoAlphaError::Registry(format!(
                "record {} has non-finite scores",
                self.id
            )));
        }
        if self.composite_sharpe <= 0.0 {
            return Err(EvoAlphaError::Registry(format!(
                "record {} has non-positive Sharpe {:.3}",
                self.id, self.composite_sharpe
            )));
        }
        Ok(())
    }
}
