//! Topology registry: validated, read-only set of workers.

use super::worker::{WorkerDescriptor, WorkerRole};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors detected while building or querying the topology.
///
/// All of these are configuration errors: they are never retried and never
/// resolved by falling back to another worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("No reviewer workers configured")]
    NoReviewers,

    #[error("No synthesizer worker configured")]
    NoSynthesizer,

    #[error("Exactly one synthesizer is allowed, found: {}", .0.join(", "))]
    MultipleSynthesizers(Vec<String>),

    #[error("Worker name must not be empty")]
    EmptyName,

    #[error("Duplicate worker name: {0}")]
    DuplicateName(String),

    #[error("Workers '{first}' and '{second}' share the address {address}")]
    DuplicateAddress {
        address: String,
        first: String,
        second: String,
    },

    #[error("Worker '{name}' has an invalid address: {address}")]
    InvalidAddress { name: String, address: String },

    #[error("Title generator '{0}' is not a registered reviewer")]
    InvalidTitleGenerator(String),

    #[error("Worker '{0}' is not registered in the topology")]
    UnregisteredWorker(String),

    #[error("Worker '{worker}' is registered as {role}; synthesis requires the synthesizer role")]
    RoleViolation { worker: String, role: WorkerRole },
}

/// The council topology (Entity, immutable after construction)
///
/// Invariants established by [`Topology::new`]:
/// - at least one reviewer and exactly one synthesizer
/// - unique, non-empty names
/// - unique, well-formed addresses (one physical worker never appears
///   under two roles)
#[derive(Debug, Clone)]
pub struct Topology {
    workers: Vec<WorkerDescriptor>,
    synthesizer_index: usize,
    title_generator: Option<String>,
}

impl Topology {
    /// Validate and build a topology. Worker order is preserved; it is the
    /// order round-1 responses are labelled in.
    pub fn new(workers: Vec<WorkerDescriptor>) -> Result<Self, TopologyError> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut addresses: HashMap<&str, &str> = HashMap::new();

        for worker in &workers {
            if worker.name.trim().is_empty() {
                return Err(TopologyError::EmptyName);
            }
            if !names.insert(worker.name.as_str()) {
                return Err(TopologyError::DuplicateName(worker.name.clone()));
            }
            if !worker.has_valid_address() {
                return Err(TopologyError::InvalidAddress {
                    name: worker.name.clone(),
                    address: worker.address.clone(),
                });
            }
            if let Some(first) = addresses.insert(worker.address.as_str(), worker.name.as_str()) {
                return Err(TopologyError::DuplicateAddress {
                    address: worker.address.clone(),
                    first: first.to_string(),
                    second: worker.name.clone(),
                });
            }
        }

        if !workers.iter().any(|w| w.role == WorkerRole::Reviewer) {
            return Err(TopologyError::NoReviewers);
        }

        let synthesizers: Vec<usize> = workers
            .iter()
            .enumerate()
            .filter(|(_, w)| w.is_synthesizer())
            .map(|(i, _)| i)
            .collect();

        let synthesizer_index = match synthesizers.as_slice() {
            [] => return Err(TopologyError::NoSynthesizer),
            [only] => *only,
            many => {
                return Err(TopologyError::MultipleSynthesizers(
                    many.iter().map(|&i| workers[i].name.clone()).collect(),
                ));
            }
        };

        Ok(Self {
            workers,
            synthesizer_index,
            title_generator: None,
        })
    }

    /// Designate the reviewer that generates conversation titles.
    pub fn with_title_generator(mut self, name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        match self.get(&name) {
            Some(worker) if worker.role == WorkerRole::Reviewer => {
                self.title_generator = Some(name);
                Ok(self)
            }
            _ => Err(TopologyError::InvalidTitleGenerator(name)),
        }
    }

    /// All workers in registration order
    pub fn workers(&self) -> &[WorkerDescriptor] {
        &self.workers
    }

    /// Reviewer workers in registration order
    pub fn reviewers(&self) -> impl Iterator<Item = &WorkerDescriptor> {
        self.workers
            .iter()
            .filter(|w| w.role == WorkerRole::Reviewer)
    }

    pub fn reviewer_count(&self) -> usize {
        self.reviewers().count()
    }

    /// The single synthesizer worker
    pub fn synthesizer(&self) -> &WorkerDescriptor {
        &self.workers[self.synthesizer_index]
    }

    pub fn get(&self, name: &str) -> Option<&WorkerDescriptor> {
        self.workers.iter().find(|w| w.name == name)
    }

    /// Check that `candidate` is the registered synthesizer.
    ///
    /// The registry entry is authoritative: a descriptor that claims the
    /// synthesizer role but is not registered as such is rejected, as is any
    /// descriptor whose address differs from the registered one.
    pub fn verify_synthesizer(
        &self,
        candidate: &WorkerDescriptor,
    ) -> Result<&WorkerDescriptor, TopologyError> {
        let registered = self
            .get(&candidate.name)
            .filter(|w| w.address == candidate.address)
            .ok_or_else(|| TopologyError::UnregisteredWorker(candidate.name.clone()))?;

        if registered.role != WorkerRole::Synthesizer {
            return Err(TopologyError::RoleViolation {
                worker: registered.name.clone(),
                role: registered.role,
            });
        }
        Ok(registered)
    }

    /// Reviewer used for title generation: the configured one, else the
    /// first reviewer. Never the synthesizer.
    pub fn title_worker(&self) -> Option<&WorkerDescriptor> {
        self.title_generator
            .as_deref()
            .and_then(|name| self.get(name))
            .or_else(|| self.reviewers().next())
    }
}
