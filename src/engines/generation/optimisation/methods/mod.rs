pub mod base;
pub mod wfo;

pub use base::ValidationMethod;
pub use wfo::WalkForwardMethod;
