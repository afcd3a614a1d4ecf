mod csv;
mod types;
mod validator;

pub use csv::{CsvConnector, CsvMarketData};
pub use types::{DatasetMetadata, DATE_ALIASES, VOLUME_SUFFIX};
pub use validator::DataValidator;
