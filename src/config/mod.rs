//! Configuration model for siesta.
//!
//! This module defines the Config struct that represents `config.yaml`.
//! It supports forward-compatible YAML parsing (unknown fields are ignored),
//! sensible defaults for every field, and validation of config values.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::Config;
pub use operations::SCRIPT_PATH_ENV;
pub use types::ProviderConfig;
