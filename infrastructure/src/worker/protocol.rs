//! Wire types for the worker HTTP contract.
//!
//! # Endpoints
//!
//! - `POST {base}/chat`: any worker, prompt messages in, model text out
//! - `POST {base}/synthesize`: synthesizer only, round 1 + round 2 bundle in
//! - `GET {base}/health`: liveness plus backend status
//!
//! Replies are decoded leniently: unknown fields are ignored and the
//! alternate spellings older workers use are accepted as aliases.

use council_application::{ChatRequest, SynthesisRequest, WorkerReply};
use council_domain::{Aggregates, BackendStatus, LabelMapping, ReviewScore, TokenInfo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `{role, content}` message
#[derive(Debug, Clone, Serialize)]
pub struct MessageBody<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatBody<'a> {
    pub messages: Vec<MessageBody<'a>>,
    /// Passed through to the backend untouched
    pub options: serde_json::Map<String, serde_json::Value>,
    pub timeout_s: f64,
}

impl<'a> From<&'a ChatRequest> for ChatBody<'a> {
    fn from(request: &'a ChatRequest) -> Self {
        Self {
            messages: request
                .messages
                .iter()
                .map(|m| MessageBody {
                    role: m.role,
                    content: &m.content,
                })
                .collect(),
            options: serde_json::Map::new(),
            timeout_s: request.timeout.as_secs_f64(),
        }
    }
}

/// One round-1 answer in the synthesis bundle
#[derive(Debug, Clone, Serialize)]
pub struct Stage1Entry<'a> {
    pub model: &'a str,
    pub response: &'a str,
}

/// One round-2 review in the synthesis bundle
#[derive(Debug, Clone, Serialize)]
pub struct Stage2Entry<'a> {
    pub model: &'a str,
    /// Raw review text
    pub ranking: &'a str,
    pub parsed_ranking: Vec<String>,
    pub parsed_scores: BTreeMap<String, ReviewScore>,
    pub parse_status: &'static str,
}

/// Body of `POST /synthesize`
#[derive(Debug, Clone, Serialize)]
pub struct SynthesizeBody<'a> {
    pub user_query: &'a str,
    pub stage1: Vec<Stage1Entry<'a>>,
    pub stage2: Vec<Stage2Entry<'a>>,
    pub label_mapping: &'a LabelMapping,
    pub aggregates: &'a Aggregates,
    pub timeout_s: f64,
}

impl<'a> From<&'a SynthesisRequest> for SynthesizeBody<'a> {
    fn from(request: &'a SynthesisRequest) -> Self {
        Self {
            user_query: request.question.content(),
            stage1: request
                .round1
                .iter()
                .map(|r| Stage1Entry {
                    model: &r.worker,
                    response: &r.text,
                })
                .collect(),
            stage2: request
                .round2
                .iter()
                .map(|review| Stage2Entry {
                    model: &review.reviewer,
                    ranking: &review.raw_text,
                    parsed_ranking: review.ranking().iter().map(ToString::to_string).collect(),
                    parsed_scores: review
                        .parsed
                        .scores()
                        .map(|scores| {
                            scores
                                .iter()
                                .map(|(label, score)| (label.to_string(), *score))
                                .collect()
                        })
                        .unwrap_or_default(),
                    parse_status: review.parsed.status(),
                })
                .collect(),
            label_mapping: &request.label_mapping,
            aggregates: &request.aggregates,
            timeout_s: request.timeout.as_secs_f64(),
        }
    }
}

/// Token counts some workers attach to their replies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenCounts {
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
    #[serde(default)]
    pub total_tokens: Option<u64>,
}

impl TokenCounts {
    fn into_token_info(self) -> Option<TokenInfo> {
        TokenInfo::from_counts(
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
        )
    }
}

/// Reply of `POST /chat`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default, alias = "identity")]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenCounts,
}

/// Reply of `POST /synthesize`
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesizeReply {
    #[serde(alias = "content", alias = "text")]
    pub response: String,
    #[serde(default)]
    pub latency_ms: Option<f64>,
    #[serde(default, alias = "identity")]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(flatten)]
    pub tokens: TokenCounts,
}

/// Reply of `GET /health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "ollama_ok")]
    pub backend_ok: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub busy: Option<bool>,
    #[serde(default)]
    pub active_requests: Option<u32>,
}

/// Latency the worker reported, else what the caller measured.
fn latency(reported: Option<f64>, measured_ms: u64) -> u64 {
    match reported {
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms.round() as u64,
        _ => measured_ms,
    }
}

impl ChatReply {
    pub fn into_reply(self, measured_ms: u64) -> WorkerReply {
        WorkerReply {
            text: self.content,
            latency_ms: latency(self.latency_ms, measured_ms),
            identity: self.worker_name,
            model: self.model,
            token_info: self.tokens.into_token_info(),
        }
    }
}

impl SynthesizeReply {
    pub fn into_reply(self, measured_ms: u64) -> WorkerReply {
        WorkerReply {
            text: self.response,
            latency_ms: latency(self.latency_ms, measured_ms),
            identity: self.worker_name,
            model: self.model,
            token_info: self.tokens.into_token_info(),
        }
    }
}

impl From<HealthReply> for BackendStatus {
    /// Without an explicit backend flag, `status: "ok"` counts as healthy.
    fn from(reply: HealthReply) -> Self {
        let backend_ok = reply
            .backend_ok
            .unwrap_or_else(|| reply.status.as_deref() == Some("ok"));
        BackendStatus {
            backend_ok,
            model: reply.model,
            busy: reply.busy,
            active_requests: reply.active_requests,
        }
    }
}
