//! Council deliberation domain
//!
//! Anonymous labelling, peer review parsing and cross-reviewer aggregation.

pub mod aggregate;
pub mod label;
pub mod parsing;
pub mod response;
pub mod review;
pub mod round;

pub use aggregate::{AggregateRank, AggregateScore, Aggregates, RankTie};
pub use label::{Label, LabelMapping, ReviewAssignment};
pub use parsing::{RANKING_HEADER, SCORES_HEADER, parse_review};
pub use response::{CouncilMetadata, CouncilResult, RoundResponse, TokenInfo, WorkerFailure};
pub use review::{ParseIssue, ParsedContent, ParsedReview, ReviewRecord, ReviewScore};
pub use round::Round;
