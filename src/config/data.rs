use super::traits::ConfigSection;
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// Seeded regime-switching random returns.
    Synthetic { assets: usize, bars: usize, seed: u64 },
    /// Wide price CSV: a date column plus one price column per asset.
    Csv { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub source: DataSource,
    /// Rows below which a table is treated as unusable.
    pub min_rows: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Synthetic { assets: 3, bars: 1500, seed: 7 },
            min_rows: 60,
        }
    }
}

impl ConfigSection for DataConfig {
    fn section_name() -> &'static str {
        "data"
    }

    fn validate(&self) -> Result<(), EvoAlphaError> {
        if let DataSource::Synthetic { assets, bars, .. } = &self.source {
            if *assets == 0 || *bars < 2 {
                return Err(EvoAlphaError::Configuration(
                    "Synthetic data needs at least one asset and two bars".to_string(),
                ));
            }
        }
        Ok(())
    }
}
