use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Longest `top_n` age window accepted, in days.
pub const MAX_AGE_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// JSON-lines file; an in-memory registry is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub top_n: usize,
    /// `top_n` query filters.
    pub min_sharpe: f64,
    pub min_persistence: f64,
    pub min_diversity: f64,
    pub max_age_days: i64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: None,
            top_n: 25,
            min_sharpe: 3.8,
            min_persistence: 0.85,
            min_diversity: 0.6,
            max_age_days: 30,
        }
    }
}

impl ConfigSection for RegistryConfig {
    fn section_name() -> &'static str {
        "registry"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        if [self.min_sharpe, self.min_persistence, self.min_diversity]
            .iter()
            .any(|v| v.is_nan())
        {
            return Err(EvoAlphaError::Configuration(
                "Registry filters must not be NaN".to_string(),
            ));
        }
        if self.max_age_days <= 0 || self.max_age_days > MAX_AGE_DAYS {
            return Err(EvoAlphaError::Configuration(format!(
                "Registry max age must be between 1 and {} days",
                MAX_AGE_DAYS
            )));
        }
        Ok(())
    }
}
