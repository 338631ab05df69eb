//! Streaming events of one agent exchange.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the remote task, as reported in `status.state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Submitted,
    Working,
    InputRequired,
    AuthRequired,
    Completed,
    Failed,
    Canceled,
    Rejected,
    Unknown(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::InputRequired => "input-required",
            TaskState::AuthRequired => "auth-required",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Canceled => "canceled",
            TaskState::Rejected => "rejected",
            TaskState::Unknown(s) => s,
        }
    }

    /// States after which the agent sends nothing more for this turn.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }

    /// Terminal states that mean the agent could not answer.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            TaskState::Failed | TaskState::Canceled | TaskState::Rejected
        )
    }
}

impl std::str::FromStr for TaskState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "submitted" => TaskState::Submitted,
            "working" => TaskState::Working,
            "input-required" | "input_required" => TaskState::InputRequired,
            "auth-required" | "auth_required" => TaskState::AuthRequired,
            "completed" => TaskState::Completed,
            "failed" => TaskState::Failed,
            "canceled" | "cancelled" => TaskState::Canceled,
            "rejected" => TaskState::Rejected,
            other => TaskState::Unknown(other.to_string()),
        })
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// State change without agent text
    Status,
    /// Carries a message authored by the agent
    Message,
    /// The server reported an error for the whole exchange
    Error,
}

/// One decoded event of an exchange stream.
///
/// `payload_text` is only present for [`EventKind::Message`] events whose
/// message role is `agent`; user echoes never produce text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub state: Option<TaskState>,
    pub is_final: bool,
    pub payload_text: Option<String>,
    pub context_id: Option<String>,
    pub error_message: Option<String>,
}

impl StreamEvent {
    /// A status update.
    pub fn status(state: TaskState) -> Self {
        Self {
            kind: EventKind::Status,
            state: Some(state),
            is_final: false,
            payload_text: None,
            context_id: None,
            error_message: None,
        }
    }

    /// An event carrying agent text.
    pub fn agent_message(state: Option<TaskState>, text: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Message,
            state,
            is_final: false,
            payload_text: Some(text.into()),
            context_id: None,
            error_message: None,
        }
    }

    /// An error reported by the server. Always terminal.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: EventKind::Error,
            state: None,
            is_final: true,
            payload_text: None,
            context_id: None,
            error_message: Some(message.into()),
        }
    }

    pub fn with_context_id(mut self, context_id: impl Into<String>) -> Self {
        self.context_id = Some(context_id.into());
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    /// Returns true if this event ends the exchange.
    pub fn is_terminal(&self) -> bool {
        self.is_final
            || self.kind == EventKind::Error
            || self.state.as_ref().is_some_and(TaskState::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_parse() {
        assert_eq!("completed".parse::<TaskState>().unwrap(), TaskState::Completed);
        assert_eq!("input-required".parse::<TaskState>().unwrap(), TaskState::InputRequired);
        assert_eq!("cancelled".parse::<TaskState>().unwrap(), TaskState::Canceled);
        assert_eq!(
            "paused".parse::<TaskState>().unwrap(),
            TaskState::Unknown("paused".to_string())
        );
    }

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::Working.is_terminal());
        assert!(!TaskState::InputRequired.is_terminal());
        assert!(!TaskState::Completed.is_failure());
        assert!(TaskState::Rejected.is_failure());
    }

    #[test]
    fn test_event_terminal_by_final_flag() {
        let event = StreamEvent::status(TaskState::InputRequired);
        assert!(!event.is_terminal());
        assert!(event.with_final(true).is_terminal());
    }

    #[test]
    fn test_event_terminal_by_state_or_error() {
        assert!(StreamEvent::status(TaskState::Completed).is_terminal());
        assert!(!StreamEvent::agent_message(Some(TaskState::Working), "hi").is_terminal());
        assert!(StreamEvent::error("boom").is_terminal());
    }
}
