//! Port for structured council transcripts.
//!
//! Defines the [`ConversationLogger`] trait for recording council events
//! (round responses, reviews, synthesis, round failures) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the full
//! transcript in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured council event for logging.
pub struct ConversationEvent {
    /// Event type identifier (e.g., "round1_response", "round_failed").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging council events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and infallible so that a broken log file never
/// interrupts a council run.
pub trait ConversationLogger: Send + Sync {
    /// Record a council event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
