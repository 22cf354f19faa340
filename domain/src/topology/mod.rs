//! Council topology: the static directory of worker services.
//!
//! The topology is loaded once per process and never mutated afterwards.
//! It is the single source of truth for which worker may serve which round:
//! reviewers answer and review, the one synthesizer writes the final answer.

pub mod registry;
pub mod worker;

pub use registry::{Topology, TopologyError};
pub use worker::{WorkerDescriptor, WorkerRole};
