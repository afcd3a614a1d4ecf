pub mod table;
pub mod provider;
pub mod synthetic;
pub mod connectors;

pub use table::ReturnTable;
pub use provider::{dynamic_train_ratio, MarketDataProvider, StaticMarketData};
pub use synthetic::SyntheticMarketData;
pub use connectors::{CsvMarketData, DataValidator, DatasetMetadata};
