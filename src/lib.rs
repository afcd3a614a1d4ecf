pub mod config;
pub mod data;
pub mod engines;
pub mod error;
pub mod hypothesis;
pub mod registry;
pub mod types;
