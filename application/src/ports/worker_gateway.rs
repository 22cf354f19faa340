//! Worker Gateway port
//!
//! Defines the interface for calling remote worker services.

use async_trait::async_trait;
use council_domain::{
    Aggregates, BackendStatus, LabelMapping, Question, ReviewRecord, RoundResponse, TokenInfo,
    WorkerDescriptor,
};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during a worker call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Other error: {0}")]
    Other(String),
}

/// One chat message sent to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Prompt payload for `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    /// Forwarded to the worker so it can give up on its side as well
    pub timeout: Duration,
}

impl ChatRequest {
    pub fn new(system: &str, user: impl Into<String>, timeout: Duration) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            timeout,
        }
    }

    /// A request with a single user message
    pub fn user_only(user: impl Into<String>, timeout: Duration) -> Self {
        Self {
            messages: vec![ChatMessage::user(user)],
            timeout,
        }
    }

    /// Content of the last user message
    pub fn user_content(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Aggregated context for the role-restricted `POST /synthesize`
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub question: Question,
    pub round1: Vec<RoundResponse>,
    pub round2: Vec<ReviewRecord>,
    pub label_mapping: LabelMapping,
    pub aggregates: Aggregates,
    pub timeout: Duration,
}

/// A successful worker answer
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReply {
    pub text: String,
    pub latency_ms: u64,
    /// Identity the worker reported for itself, if any
    pub identity: Option<String>,
    /// Backend model that produced the text
    pub model: Option<String>,
    pub token_info: Option<TokenInfo>,
}

impl WorkerReply {
    pub fn new(text: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            text: text.into(),
            latency_ms,
            identity: None,
            model: None,
            token_info: None,
        }
    }

    /// Attribute the reply to the registered worker.
    ///
    /// The registry name is the identity; whatever the worker calls itself
    /// is informational only.
    pub fn into_response(self, worker: &WorkerDescriptor) -> RoundResponse {
        let mut response = RoundResponse::new(worker.identity(), self.text, self.latency_ms)
            .with_token_info(self.token_info);
        if let Some(model) = self.model {
            response = response.with_model(model);
        }
        response
    }
}

/// Gateway for worker communication
///
/// This port defines how the application layer reaches worker services.
/// Implementations (adapters) live in the infrastructure layer. A gateway
/// never retries and never substitutes one worker for another.
#[async_trait]
pub trait WorkerGateway: Send + Sync {
    /// `POST /chat` on any worker
    async fn chat(
        &self,
        worker: &WorkerDescriptor,
        request: &ChatRequest,
    ) -> Result<WorkerReply, GatewayError>;

    /// `POST /synthesize`. Callers verify the worker's role first.
    async fn synthesize(
        &self,
        worker: &WorkerDescriptor,
        request: &SynthesisRequest,
    ) -> Result<WorkerReply, GatewayError>;

    /// `GET /health`. `Ok` means the worker is reachable.
    async fn health(
        &self,
        worker: &WorkerDescriptor,
        timeout: Duration,
    ) -> Result<BackendStatus, GatewayError>;
}
