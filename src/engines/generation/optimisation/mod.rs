pub mod methods;
pub mod splitters;

pub use methods::{ValidationMethod, WalkForwardMethod};
pub use splitters::{DataSplit, DataSplitter, SplitConfig, WalkForwardSplitter};
