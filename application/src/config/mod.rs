//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave,
//! such as call timeouts and the health poll cadence.

use std::time::Duration;

/// Application behavior configuration.
///
/// Controls runtime behavior of the council: per-call timeouts, health
/// polling and the progress channel size.
#[derive(Debug, Clone)]
pub struct BehaviorConfig {
    /// Deadline for each round-1, round-2 and round-3 worker call.
    pub request_timeout: Duration,
    /// Deadline for the title generation call.
    pub title_timeout: Duration,
    /// Deadline for a single health probe.
    pub health_probe_timeout: Duration,
    /// Time between two health polls.
    pub health_poll_interval: Duration,
    /// A worker is offline once not seen for this many poll intervals.
    pub offline_multiplier: u32,
    /// Capacity of the per-query progress channel.
    pub channel_capacity: usize,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(180),
            title_timeout: Duration::from_secs(30),
            health_probe_timeout: Duration::from_secs(2),
            health_poll_interval: Duration::from_secs(5),
            offline_multiplier: 3,
            channel_capacity: 32,
        }
    }
}

impl BehaviorConfig {
    // ==================== Builder Methods ====================

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_title_timeout(mut self, timeout: Duration) -> Self {
        self.title_timeout = timeout;
        self
    }

    pub fn with_health_probe_timeout(mut self, timeout: Duration) -> Self {
        self.health_probe_timeout = timeout;
        self
    }

    pub fn with_health_poll_interval(mut self, interval: Duration) -> Self {
        self.health_poll_interval = interval;
        self
    }

    pub fn with_offline_multiplier(mut self, multiplier: u32) -> Self {
        self.offline_multiplier = multiplier;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// `offline_multiplier × health_poll_interval`
    pub fn offline_threshold(&self) -> Duration {
        self.health_poll_interval * self.offline_multiplier
    }
}
