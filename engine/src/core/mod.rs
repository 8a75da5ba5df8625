//! Engine configuration

pub mod config;
pub mod constants;

pub use config::{EngineConfig, FileConfig};
