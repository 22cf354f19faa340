//! Runtime tuning from TOML (`[timeouts]`, `[health]`, `[stream]`)

use serde::{Deserialize, Serialize};

/// `[timeouts]`, all in seconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTimeoutsConfig {
    /// Each round-1, round-2 and round-3 call
    pub request_secs: u64,
    /// The title generation call
    pub title_secs: u64,
    /// One health probe
    pub health_probe_secs: u64,
}

impl Default for FileTimeoutsConfig {
    fn default() -> Self {
        Self {
            request_secs: 180,
            title_secs: 30,
            health_probe_secs: 2,
        }
    }
}

/// `[health]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    /// Seconds between polls; 0 disables the monitor
    pub poll_interval_secs: u64,
    /// Poll intervals without contact before a worker counts as offline
    pub offline_multiplier: u32,
}

impl Default for FileHealthConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
            offline_multiplier: 3,
        }
    }
}

/// `[stream]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStreamConfig {
    /// Events buffered per query before the orchestrator waits on the consumer
    pub channel_capacity: usize,
}

impl Default for FileStreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 32,
        }
    }
}
