//! Configuration file loading for llm-council
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNCIL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./council.toml` or `./.council.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/llm-council/config.toml`
//! 5. Default values
//!
//! [`build_topology`] turns the loaded worker entries (or a legacy JSON
//! topology file) into a validated [`Topology`](council_domain::Topology).

mod error;
mod file_config;
mod loader;
mod topology;

pub use error::ConfigError;
pub use file_config::{
    FileConfig, FileHealthConfig, FileLoggingConfig, FileOutputConfig, FileStreamConfig,
    FileTimeoutsConfig, FileWorkerConfig,
};
pub use loader::ConfigLoader;
pub use topology::build_topology;
