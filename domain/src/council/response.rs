//! Round responses and the composed council result.

use super::aggregate::{AggregateRank, AggregateScore, RankTie};
use super::label::LabelMapping;
use super::review::ReviewRecord;
use crate::core::question::Question;
use serde::{Deserialize, Serialize};

/// Token accounting reported by a worker, when it reports any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
}

impl TokenInfo {
    /// Build token info, or `None` when the worker reported no counts at all.
    ///
    /// A missing total is derived when both parts are known.
    pub fn from_counts(
        prompt_tokens: Option<u64>,
        completion_tokens: Option<u64>,
        total_tokens: Option<u64>,
    ) -> Option<Self> {
        let total_tokens = total_tokens.or(match (prompt_tokens, completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        });
        if prompt_tokens.is_none() && completion_tokens.is_none() && total_tokens.is_none() {
            return None;
        }
        Some(Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        })
    }
}

/// One successful worker call. Failed calls never produce a `RoundResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResponse {
    /// Worker identity (registry name)
    pub worker: String,
    pub text: String,
    pub latency_ms: u64,
    /// Backend model name reported by the worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<TokenInfo>,
}

impl RoundResponse {
    pub fn new(worker: impl Into<String>, text: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            worker: worker.into(),
            text: text.into(),
            latency_ms,
            model: None,
            token_info: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_token_info(mut self, token_info: Option<TokenInfo>) -> Self {
        self.token_info = token_info;
        self
    }
}

/// A worker that did not contribute to a round, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerFailure {
    pub worker: String,
    pub reason: String,
}

impl WorkerFailure {
    pub fn new(worker: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            worker: worker.into(),
            reason: reason.into(),
        }
    }
}

/// De-anonymization data and cross-reviewer summaries.
#[derive(Debug, Clone, Serialize)]
pub struct CouncilMetadata {
    pub label_mapping: LabelMapping,
    pub aggregate_ranks: Vec<AggregateRank>,
    pub aggregate_scores: Vec<AggregateScore>,
    /// Groups of identities sharing an average rank, never broken silently
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rank_ties: Vec<RankTie>,
}

/// Composed result of a full council run
#[derive(Debug, Clone, Serialize)]
pub struct CouncilResult {
    pub question: Question,
    pub round1: Vec<RoundResponse>,
    pub round2: Vec<ReviewRecord>,
    pub round3: RoundResponse,
    pub metadata: CouncilMetadata,
    /// Workers missing from round 1, with reasons
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub round1_failures: Vec<WorkerFailure>,
    /// Reviewers missing from round 2, with reasons
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub round2_failures: Vec<WorkerFailure>,
}

impl CouncilResult {
    /// Reviews whose text yielded no ranking and no scores
    pub fn unparsed_reviews(&self) -> impl Iterator<Item = &ReviewRecord> {
        self.round2.iter().filter(|r| r.parsed.is_failed())
    }

    /// Whether anything is missing or unparsed
    pub fn is_partial(&self) -> bool {
        !self.round1_failures.is_empty()
            || !self.round2_failures.is_empty()
            || self.unparsed_reviews().next().is_some()
    }
}
