//! HTTP adapter for the [`WorkerGateway`] port.

use super::protocol::{ChatBody, ChatReply, HealthReply, SynthesizeBody, SynthesizeReply};
use async_trait::async_trait;
use council_application::{ChatRequest, GatewayError, SynthesisRequest, WorkerGateway, WorkerReply};
use council_domain::core::string::truncate_str;
use council_domain::{BackendStatus, WorkerDescriptor};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::debug;

/// Error bodies are cut to this many bytes before they end up in a reason
const MAX_ERROR_BODY: usize = 300;

const USER_AGENT: &str = concat!("llm-council/", env!("CARGO_PKG_VERSION"));

/// [`WorkerGateway`] over plain HTTP + JSON.
///
/// One shared `reqwest::Client` (connection pool) for every worker. Each
/// call carries its own timeout; nothing is retried.
#[derive(Debug, Clone, Default)]
pub struct HttpWorkerGateway {
    client: reqwest::Client,
}

impl HttpWorkerGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, TLS roots, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<(T, u64), GatewayError> {
        let start = Instant::now();
        let response = builder
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_transport_error(e, timeout))?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        if !status.is_success() {
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                body: truncate_str(body.trim(), MAX_ERROR_BODY).to_string(),
            });
        }

        let decoded = serde_json::from_str(&body).map_err(|e| {
            GatewayError::InvalidResponse(format!(
                "{} (body: {})",
                e,
                truncate_str(body.trim(), MAX_ERROR_BODY)
            ))
        })?;
        Ok((decoded, elapsed_ms))
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout(timeout)
    } else if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else if err.is_connect() || err.is_request() || err.is_body() {
        GatewayError::ConnectionError(err.to_string())
    } else {
        GatewayError::Other(err.to_string())
    }
}

#[async_trait]
impl WorkerGateway for HttpWorkerGateway {
    async fn chat(
        &self,
        worker: &WorkerDescriptor,
        request: &ChatRequest,
    ) -> Result<WorkerReply, GatewayError> {
        let url = worker.endpoint("/chat");
        debug!("POST {} ({})", url, worker.name);
        let builder = self.client.post(&url).json(&ChatBody::from(request));
        let (reply, elapsed_ms): (ChatReply, u64) = self.send(builder, request.timeout).await?;
        Ok(reply.into_reply(elapsed_ms))
    }

    async fn synthesize(
        &self,
        worker: &WorkerDescriptor,
        request: &SynthesisRequest,
    ) -> Result<WorkerReply, GatewayError> {
        let url = worker.endpoint("/synthesize");
        debug!(
            "POST {} ({}, {} responses, {} reviews)",
            url,
            worker.name,
            request.round1.len(),
            request.round2.len()
        );
        let builder = self.client.post(&url).json(&SynthesizeBody::from(request));
        let (reply, elapsed_ms): (SynthesizeReply, u64) =
            self.send(builder, request.timeout).await?;
        Ok(reply.into_reply(elapsed_ms))
    }

    async fn health(
        &self,
        worker: &WorkerDescriptor,
        timeout: Duration,
    ) -> Result<BackendStatus, GatewayError> {
        let builder = self.client.get(worker.endpoint("/health"));
        let (reply, _): (HealthReply, u64) = self.send(builder, timeout).await?;
        Ok(reply.into())
    }
}
