use serde::{Deserialize, Serialize};

/// Column names treated as period labels rather than prices.
pub const DATE_ALIASES: [&str; 6] = ["date", "Date", "DATE", "timestamp", "Timestamp", "time"];

/// `<asset>_volume` columns carry traded volume for `<asset>`.
pub const VOLUME_SUFFIX: &str = "_volume";

/// Metadata about a loaded price file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub file_path: String,
    pub num_rows: usize,
    pub assets: Vec<String>,
    pub has_volume: bool,
    pub period: Option<String>,
    pub invalid_returns: usize,
}
