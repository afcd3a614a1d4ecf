use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvoAlphaError {
    #[error("No market data available: {0}")]
    DataUnavailable(String),

    #[error("Insufficient data: need at least {required} rows, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EvoAlphaError>;
