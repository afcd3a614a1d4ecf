use super::{
    backtesting::BacktestingConfig,
    data::DataConfig,
    evolution::EvolutionConfig,
    fitness::FitnessConfig,
    gate::GateConfig,
    genome::GenomeConfig,
    registry::RegistryConfig,
    traits::ConfigSection,
};
use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};

/// Prefix for environment overrides, e.g. `EVOALPHA__EVOLUTION__POPULATION_SIZE=400`.
pub const ENV_PREFIX: &str = "EVOALPHA";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub genome: GenomeConfig,
    pub backtesting: BacktestingConfig,
    pub fitness: FitnessConfig,
    pub gate: GateConfig,
    pub data: DataConfig,
    pub registry: RegistryConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvoAlphaError> {
        self.evolution.validate()?;
        self.genome.validate()?;
        self.backtesting.validate()?;
        self.fitness.validate()?;
        self.gate.validate()?;
        self.data.validate()?;
        self.registry.validate()?;
        Ok(())
    }

    /// One-line summary of the values that drive reported results.
    pub fn summary(&self) -> String {
        format!(
            "population={} generations={} folds={} genes={} gate(sharpe>{}, persistence>{}, consistency>{}, diversity>{}, drawdown<={})",
            self.evolution.population_size,
            self.evolution.num_generations,
            self.backtesting.fold_count,
            self.genome.len(),
            self.gate.min_oos_sharpe,
            self.gate.min_persistence,
            self.gate.min_consistency,
            self.gate.min_diversity,
            self.gate.max_drawdown,
        )
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvoAlphaError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| EvoAlphaError::Configuration(format!("Failed to read config: {}", e)))?;

        let config: AppConfig = toml::from_str(&contents)
            .map_err(|e| EvoAlphaError::Configuration(format!("Failed to parse config: {}", e)))?;

        self.replace(config)
    }

    /// Load an optional TOML file, then apply `EVOALPHA__SECTION__FIELD` overrides.
    pub fn load_layered<P: AsRef<Path>>(&self, path: Option<P>) -> Result<(), EvoAlphaError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        self.replace(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvoAlphaError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config)
            .map_err(|e| EvoAlphaError::Configuration(format!("Failed to serialize: {}", e)))?;

        std::fs::write(path, toml_str)
            .map_err(|e| EvoAlphaError::Configuration(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update<F>(&self, f: F) -> Result<(), EvoAlphaError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut candidate = self.get();
        f(&mut candidate);
        self.replace(candidate)
    }

    fn replace(&self, config: AppConfig) -> Result<(), EvoAlphaError> {
        config.validate()?;
        let mut guard = self
            .config
            .write()
            .map_err(|_| EvoAlphaError::Configuration("Config lock poisoned".to_string()))?;
        *guard = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_save_and_reload_preserves_thresholds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evoalpha.toml");

        let manager = ConfigManager::new();
        manager
            .update(|c| {
                c.gate.min_oos_sharpe = 3.8;
                c.evolution.population_size = 64;
            })
            .unwrap();
        manager.save_to_file(&path).unwrap();

        let reloaded = ConfigManager::new();
        reloaded.load_from_file(&path).unwrap();
        let config = reloaded.get();
        assert_eq!(config.gate.min_oos_sharpe, 3.8);
        assert_eq!(config.evolution.population_size, 64);
        assert_eq!(config.fitness.shocks.len(), 4);
    }

    #[test]
    fn test_invalid_update_is_rejected_and_not_applied() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.backtesting.fold_count = 0);
        assert!(result.is_err());
        assert_eq!(manager.get().backtesting.fold_count, 4);
    }

    #[test]
    fn test_layered_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[evolution]\npopulation_size = 32\n\n[gate]\nmin_oos_sharpe = 3.0\n").unwrap();

        let manager = ConfigManager::new();
        manager.load_layered(Some(&path)).unwrap();
        let config = manager.get();
        assert_eq!(config.evolution.population_size, 32);
        assert_eq!(config.gate.min_oos_sharpe, 3.0);
        assert_eq!(config.gate.min_persistence, 0.85);
        assert_eq!(config.genome.len(), 8);
    }
}
