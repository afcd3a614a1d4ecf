use crate::error::EvoAlphaError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), EvoAlphaError>;
}

pub(crate) fn check_probability(name: &str, value: f64) -> Result<(), EvoAlphaError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EvoAlphaError::Configuration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}
