//! Aggregated health view served to clients.

use super::record::{HealthRecord, WorkerStatus};
use crate::topology::{Topology, WorkerDescriptor, WorkerRole};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;

/// One worker's row in the health view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerHealth {
    pub name: String,
    pub role: WorkerRole,
    pub address: String,
    pub status: WorkerStatus,
    /// Advisory only; request handling never consults it
    pub offline: bool,
    pub record: HealthRecord,
}

/// `{reviewers: [...], synthesizer: ...}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CouncilHealth {
    pub checked_at: DateTime<Utc>,
    pub reviewers: Vec<WorkerHealth>,
    pub synthesizer: WorkerHealth,
}

impl CouncilHealth {
    /// Build the view from a snapshot of records. Workers without a record
    /// are reported as unknown.
    pub fn build(
        topology: &Topology,
        records: &HashMap<String, HealthRecord>,
        now: DateTime<Utc>,
        offline_threshold: Duration,
    ) -> Self {
        let row = |worker: &WorkerDescriptor| {
            let record = records
                .get(&worker.name)
                .cloned()
                .unwrap_or_else(|| HealthRecord::new(&worker.name));
            WorkerHealth {
                name: worker.name.clone(),
                role: worker.role,
                address: worker.address.clone(),
                status: record.status,
                offline: record.is_offline(now, offline_threshold),
                record,
            }
        };

        Self {
            checked_at: now,
            reviewers: topology.reviewers().map(row).collect(),
            synthesizer: row(topology.synthesizer()),
        }
    }

    pub fn all(&self) -> impl Iterator<Item = &WorkerHealth> {
        self.reviewers.iter().chain(std::iter::once(&self.synthesizer))
    }

    pub fn online_count(&self) -> usize {
        self.all()
            .filter(|w| w.status.is_reachable() && !w.offline)
            .count()
    }
}
