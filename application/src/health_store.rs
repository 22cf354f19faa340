//! Shared worker health state.
//!
//! One writer (the health monitor, inside this crate) and any number of
//! readers, which only ever see cloned snapshots. Request handling has no
//! way to write here.

use chrono::{DateTime, Utc};
use council_domain::{CouncilHealth, HealthRecord, ProbeOutcome, Topology};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Health records keyed by worker name
#[derive(Debug, Clone, Default)]
pub struct HealthStore {
    records: Arc<RwLock<HashMap<String, HealthRecord>>>,
}

impl HealthStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a probe outcome. Only the health monitor calls this.
    pub(crate) fn record(&self, worker: &str, outcome: ProbeOutcome, now: DateTime<Utc>) {
        let mut records = match self.records.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        records
            .entry(worker.to_string())
            .or_insert_with(|| HealthRecord::new(worker))
            .apply(outcome, now);
    }

    /// Copy of one worker's record
    pub fn get(&self, worker: &str) -> Option<HealthRecord> {
        self.read().get(worker).cloned()
    }

    /// Copy of every record
    pub fn snapshot(&self) -> HashMap<String, HealthRecord> {
        self.read().clone()
    }

    /// Aggregated view over the topology at `now`
    pub fn view(
        &self,
        topology: &Topology,
        now: DateTime<Utc>,
        offline_threshold: std::time::Duration,
    ) -> CouncilHealth {
        let threshold = chrono::Duration::from_std(offline_threshold)
            .unwrap_or_else(|_| chrono::Duration::MAX);
        CouncilHealth::build(topology, &self.snapshot(), now, threshold)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, HealthRecord>> {
        match self.records.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
