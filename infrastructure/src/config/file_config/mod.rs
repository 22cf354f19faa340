//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod logging;
mod output;
mod runtime;
mod workers;

pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use runtime::{FileHealthConfig, FileStreamConfig, FileTimeoutsConfig};
pub use workers::FileWorkerConfig;

use council_application::BehaviorConfig;
use council_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Inline topology
    pub workers: Vec<FileWorkerConfig>,
    /// JSON topology file, used when no `[[workers]]` are declared
    pub topology_file: Option<PathBuf>,
    /// Reviewer that generates conversation titles
    pub title_generator: Option<String>,
    pub timeouts: FileTimeoutsConfig,
    pub health: FileHealthConfig,
    pub stream: FileStreamConfig,
    pub logging: FileLoggingConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Topology rules (one synthesizer, unique names and addresses) are
    /// checked later when the topology is built.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Worker source
        if self.workers.is_empty() && self.topology_file.is_none() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoWorkers,
                "no workers configured: add [[workers]] entries or set topology_file",
            ));
        }
        if !self.workers.is_empty()
            && let Some(path) = &self.topology_file
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::TopologyFileIgnored,
                format!(
                    "topology_file '{}' is ignored because [[workers]] are declared",
                    path.display()
                ),
            ));
        }
        for worker in &self.workers {
            if let Err(e) = worker.parse_role() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownRole,
                    format!("workers.{}: {}", worker.name, e),
                ));
            }
        }

        // 2. Timeouts
        for (field, value) in [
            ("timeouts.request_secs", self.timeouts.request_secs),
            ("timeouts.title_secs", self.timeouts.title_secs),
            ("timeouts.health_probe_secs", self.timeouts.health_probe_secs),
        ] {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroTimeout,
                    format!("{} cannot be 0", field),
                ));
            }
        }
        if self.timeouts.title_secs > self.timeouts.request_secs {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::TitleTimeoutTooLong,
                format!(
                    "timeouts.title_secs ({}) is longer than timeouts.request_secs ({})",
                    self.timeouts.title_secs, self.timeouts.request_secs
                ),
            ));
        }

        // 3. Health monitor
        if self.health.poll_interval_secs == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroPollInterval,
                "health.poll_interval_secs is 0: the health monitor will not run",
            ));
        }
        if self.health.offline_multiplier == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::LowOfflineMultiplier,
                "health.offline_multiplier must be at least 1",
            ));
        }

        // 4. Progress channel
        if self.stream.channel_capacity == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroChannelCapacity,
                "stream.channel_capacity must be at least 1",
            ));
        }

        issues
    }

    /// Runtime behavior derived from the `[timeouts]`, `[health]` and
    /// `[stream]` sections.
    pub fn to_behavior_config(&self) -> BehaviorConfig {
        BehaviorConfig::default()
            .with_request_timeout(Duration::from_secs(self.timeouts.request_secs))
            .with_title_timeout(Duration::from_secs(self.timeouts.title_secs))
            .with_health_probe_timeout(Duration::from_secs(self.timeouts.health_probe_secs))
            .with_health_poll_interval(Duration::from_secs(self.health.poll_interval_secs))
            .with_offline_multiplier(self.health.offline_multiplier)
            .with_channel_capacity(self.stream.channel_capacity)
    }
}
