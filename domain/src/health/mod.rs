//! Worker health tracking

pub mod record;
pub mod view;

pub use record::{BackendStatus, HealthRecord, ProbeOutcome, WorkerStatus};
pub use view::{CouncilHealth, WorkerHealth};
