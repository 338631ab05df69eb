//! Port for structured exchange logging.
//!
//! Defines the [`ConversationLogger`] trait for recording what the relay
//! sent to which cluster and what came back, as a machine-readable transcript
//! (JSONL). This is separate from `tracing`-based diagnostics, which never
//! contain full user text.

use serde_json::Value;

/// Event type identifiers written to the transcript.
pub mod events {
    pub const EXCHANGE_STARTED: &str = "exchange_started";
    pub const EXCHANGE_COMPLETED: &str = "exchange_completed";
    pub const EXCHANGE_FAILED: &str = "exchange_failed";
    pub const PLAN_GENERATED: &str = "plan_generated";
    pub const PLAN_REJECTED: &str = "plan_rejected";
    pub const CONTEXT_RESET: &str = "context_reset";
}

/// A structured transcript event.
#[derive(Debug, Clone)]
pub struct ConversationEvent {
    /// One of the identifiers in [`events`].
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

/// Port for logging transcript events.
///
/// `log` is synchronous and infallible; a logger that cannot write drops
/// the event.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when no transcript is configured.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}
