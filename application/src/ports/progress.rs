//! Progress emission
//!
//! Each council run owns one bounded channel. The use case is the only
//! producer; a transport (progress display, SSE writer) is the consumer.
//! Dropping the receiver is how a consumer cancels: emission stops and the
//! rounds that depend on unfinished work are skipped. In-flight worker calls
//! are never aborted.

use council_domain::{CouncilResult, ReviewRecord, Round, RoundResponse};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Payload of an `error` event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<Round>,
    pub message: String,
}

/// One unit of completed work, in completion order.
///
/// Serialized as `{"type": "<kebab-case name>", "payload": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum CouncilEvent {
    /// One reviewer answered round 1
    Round1Response(RoundResponse),
    /// One reviewer finished its peer review
    Round2Review(ReviewRecord),
    /// The synthesizer answered
    Round3Response(RoundResponse),
    /// A round failed as a whole; no further rounds follow
    Error(StageError),
    /// Terminal event of a successful run, carrying the composed result
    Done(Box<CouncilResult>),
}

impl CouncilEvent {
    /// Event name as used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            CouncilEvent::Round1Response(_) => "round1-response",
            CouncilEvent::Round2Review(_) => "round2-review",
            CouncilEvent::Round3Response(_) => "round3-response",
            CouncilEvent::Error(_) => "error",
            CouncilEvent::Done(_) => "done",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CouncilEvent::Error(_) | CouncilEvent::Done(_))
    }
}

/// Create a progress channel for one council run.
pub fn progress_channel(capacity: usize) -> (ProgressEmitter, mpsc::Receiver<CouncilEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ProgressEmitter::new(tx), rx)
}

/// Producer half of the progress channel.
pub struct ProgressEmitter {
    sender: Option<mpsc::Sender<CouncilEvent>>,
    closed: AtomicBool,
}

impl ProgressEmitter {
    pub fn new(sender: mpsc::Sender<CouncilEvent>) -> Self {
        Self {
            sender: Some(sender),
            closed: AtomicBool::new(false),
        }
    }

    /// An emitter without a consumer. Events are dropped and the run is
    /// never considered cancelled.
    pub fn disabled() -> Self {
        Self {
            sender: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Send an event, waiting for channel capacity.
    ///
    /// Returns `false` once the consumer is gone; later calls return `false`
    /// without sending.
    pub async fn emit(&self, event: CouncilEvent) -> bool {
        let Some(sender) = &self.sender else {
            return true;
        };
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        let name = event.name();
        if sender.send(event).await.is_err() {
            debug!("Progress consumer disconnected before '{}' event", name);
            self.closed.store(true, Ordering::Release);
            return false;
        }
        true
    }

    /// Whether the consumer has gone away
    pub fn is_closed(&self) -> bool {
        if self.closed.load(Ordering::Acquire) {
            return true;
        }
        match &self.sender {
            Some(sender) if sender.is_closed() => {
                self.closed.store(true, Ordering::Release);
                true
            }
            _ => false,
        }
    }
}
