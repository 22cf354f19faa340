//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A query is answered in three strictly sequential rounds:
//!
//! 1. **Responses**: every reviewer worker answers independently
//! 2. **Peer Review**: answers are anonymized as `Response A`, `Response B`, ...
//!    and every reviewer scores and ranks all answers except its own
//! 3. **Synthesis**: the single synthesizer worker writes the final answer
//!
//! ## Topology
//!
//! The static set of workers and their roles. The registry role is the only
//! thing that decides who may synthesize.

pub mod config;
pub mod core;
pub mod council;
pub mod health;
pub mod prompt;
pub mod topology;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, EventFormat, OutputFormat, Severity};
pub use core::{error::DomainError, question::Question};
pub use council::{
    AggregateRank, AggregateScore, Aggregates, CouncilMetadata, CouncilResult, Label,
    LabelMapping, ParseIssue, ParsedContent, ParsedReview, RankTie, ReviewAssignment,
    ReviewRecord, ReviewScore, Round, RoundResponse, TokenInfo, WorkerFailure, parse_review,
};
pub use health::{
    BackendStatus, CouncilHealth, HealthRecord, ProbeOutcome, WorkerHealth, WorkerStatus,
};
pub use prompt::PromptTemplate;
pub use topology::{Topology, TopologyError, WorkerDescriptor, WorkerRole};
