pub mod base;
pub mod types;
pub mod wfo;

pub use base::DataSplitter;
pub use types::{DataSplit, SplitConfig};
pub use wfo::WalkForwardSplitter;
