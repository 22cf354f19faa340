//! Per-worker health record and its state machine.
//!
//! ```text
//! unknown ──► reachable ──► backend_ok
//!    │            └───────► backend_down
//!    └──────► unreachable
//! ```
//!
//! Every probe moves the record; a reachable worker can become unreachable
//! on the next tick and back again.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Result of one health probe against one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The worker answered its health endpoint.
    Reachable(BackendStatus),
    /// No usable answer: connection error, timeout or non-2xx status.
    Unreachable { reason: String },
}

/// Backend details reported by a reachable worker
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BackendStatus {
    pub backend_ok: bool,
    pub model: Option<String>,
    pub busy: Option<bool>,
    pub active_requests: Option<u32>,
}

/// Current state of a worker, as seen by the last probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    /// Never probed
    Unknown,
    Unreachable,
    /// Reachable, backend reported down
    BackendDown,
    /// Reachable, backend reported ok
    BackendOk,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Unknown => "unknown",
            WorkerStatus::Unreachable => "unreachable",
            WorkerStatus::BackendDown => "backend_down",
            WorkerStatus::BackendOk => "backend_ok",
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, WorkerStatus::BackendDown | WorkerStatus::BackendOk)
    }
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Liveness bookkeeping for one worker (Entity)
///
/// Only the health monitor writes records. Everyone else reads snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthRecord {
    pub worker: String,
    pub status: WorkerStatus,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_backend_ok: Option<DateTime<Utc>>,
    pub last_probe: Option<DateTime<Utc>>,
    pub consecutive_reachability_failures: u32,
    pub consecutive_backend_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_requests: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl HealthRecord {
    pub fn new(worker: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            status: WorkerStatus::Unknown,
            last_seen: None,
            last_backend_ok: None,
            last_probe: None,
            consecutive_reachability_failures: 0,
            consecutive_backend_failures: 0,
            backend_model: None,
            busy: None,
            active_requests: None,
            last_error: None,
        }
    }

    /// Apply one probe outcome observed at `now`.
    ///
    /// A failed liveness probe leaves `last_seen` and the backend counter
    /// untouched: an unreachable worker says nothing about its backend.
    pub fn apply(&mut self, outcome: ProbeOutcome, now: DateTime<Utc>) {
        self.last_probe = Some(now);
        match outcome {
            ProbeOutcome::Reachable(backend) => {
                self.last_seen = Some(now);
                self.consecutive_reachability_failures = 0;
                self.last_error = None;
                if backend.backend_ok {
                    self.status = WorkerStatus::BackendOk;
                    self.last_backend_ok = Some(now);
                    self.consecutive_backend_failures = 0;
                } else {
                    self.status = WorkerStatus::BackendDown;
                    self.consecutive_backend_failures += 1;
                }
                self.backend_model = backend.model.or(self.backend_model.take());
                self.busy = backend.busy;
                self.active_requests = backend.active_requests;
            }
            ProbeOutcome::Unreachable { reason } => {
                self.status = WorkerStatus::Unreachable;
                self.consecutive_reachability_failures += 1;
                self.last_error = Some(reason);
                self.busy = None;
                self.active_requests = None;
            }
        }
    }

    /// Advisory offline classification: not seen within `threshold`.
    ///
    /// A worker never probed is not offline, only unknown. A worker probed
    /// but never seen is offline.
    pub fn is_offline(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        match self.last_seen {
            Some(seen) => now - seen > threshold,
            None => self.last_probe.is_some(),
        }
    }
}
