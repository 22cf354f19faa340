//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for daily rolling diagnostic logs
    pub dir: Option<PathBuf>,
    /// JSONL file receiving the council transcript
    pub conversation_log: Option<PathBuf>,
}
