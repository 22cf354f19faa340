//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod worker;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileConfig, FileLoggingConfig, FileOutputConfig, FileWorkerConfig,
    build_topology,
};
pub use logging::JsonlConversationLogger;
pub use worker::HttpWorkerGateway;
