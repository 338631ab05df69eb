//! Reduction of an exchange stream into its final answer.

use super::stream::{EventKind, StreamEvent, TaskState};
use thiserror::Error;

/// Where the fold is in the exchange lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldState {
    AwaitingFirstEvent,
    Accumulating,
    Terminal,
    Failed,
}

/// Returned by [`StreamFold::push`] so the reader knows when to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldStep {
    Continue,
    Done,
}

/// Successful result of a folded stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldOutcome {
    /// Last agent text seen; empty if the agent finished without text
    pub text: String,
    /// Newest context id the server reported, if any
    pub context_id: Option<String>,
    pub final_state: Option<TaskState>,
    pub events_seen: usize,
}

/// Why a folded stream did not produce an answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FoldError {
    #[error("stream contained no valid events ({skipped} malformed)")]
    NoValidEvents { skipped: usize },

    #[error("stream ended before a terminal event after {events_seen} events")]
    Incomplete { events_seen: usize },

    #[error("agent reported {state}: {message}")]
    AgentFailed { state: String, message: String },

    #[error("server error: {0}")]
    ServerError(String),
}

/// Folds [`StreamEvent`]s into a [`FoldOutcome`].
///
/// Transitions: `AwaitingFirstEvent -> Accumulating` on the first valid
/// event, `-> Terminal` when an event is final or carries a terminal state,
/// `-> Failed` on a server error event. Events after `Terminal` or `Failed`
/// are ignored.
#[derive(Debug, Clone)]
pub struct StreamFold {
    state: FoldState,
    last_text: Option<String>,
    context_id: Option<String>,
    last_state: Option<TaskState>,
    error: Option<String>,
    events_seen: usize,
    skipped: usize,
}

impl Default for StreamFold {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamFold {
    pub fn new() -> Self {
        Self {
            state: FoldState::AwaitingFirstEvent,
            last_text: None,
            context_id: None,
            last_state: None,
            error: None,
            events_seen: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> &FoldState {
        &self.state
    }

    pub fn events_seen(&self) -> usize {
        self.events_seen
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, FoldState::Terminal | FoldState::Failed)
    }

    /// Record a payload that could not be decoded.
    pub fn skip_malformed(&mut self) {
        self.skipped += 1;
    }

    pub fn push(&mut self, event: StreamEvent) -> FoldStep {
        if self.is_done() {
            return FoldStep::Done;
        }
        self.events_seen += 1;
        self.state = FoldState::Accumulating;

        if let Some(id) = event.context_id.as_deref()
            && !id.is_empty()
        {
            self.context_id = Some(id.to_string());
        }

        if event.kind == EventKind::Error {
            self.error = Some(
                event
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            );
            self.state = FoldState::Failed;
            return FoldStep::Done;
        }

        if let Some(text) = event.payload_text.as_deref()
            && !text.is_empty()
        {
            self.last_text = Some(text.to_string());
        }

        let terminal = event.is_terminal();
        if let Some(state) = event.state {
            self.last_state = Some(state);
        }

        if terminal {
            self.state = FoldState::Terminal;
            FoldStep::Done
        } else {
            FoldStep::Continue
        }
    }

    /// Close the fold once the stream has ended.
    pub fn finish(self) -> Result<FoldOutcome, FoldError> {
        match self.state {
            FoldState::AwaitingFirstEvent => Err(if self.skipped > 0 {
                FoldError::NoValidEvents {
                    skipped: self.skipped,
                }
            } else {
                FoldError::Incomplete { events_seen: 0 }
            }),
            FoldState::Accumulating => Err(FoldError::Incomplete {
                events_seen: self.events_seen,
            }),
            FoldState::Failed => Err(FoldError::ServerError(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
            FoldState::Terminal => {
                if let Some(state) = self.last_state.as_ref()
                    && state.is_failure()
                {
                    return Err(FoldError::AgentFailed {
                        state: state.to_string(),
                        message: self.last_text.unwrap_or_default(),
                    });
                }
                Ok(FoldOutcome {
                    text: self.last_text.unwrap_or_default(),
                    context_id: self.context_id,
                    final_state: self.last_state,
                    events_seen: self.events_seen,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold_all(events: Vec<StreamEvent>) -> Result<FoldOutcome, FoldError> {
        let mut fold = StreamFold::new();
        for event in events {
            if fold.push(event) == FoldStep::Done {
                break;
            }
        }
        fold.finish()
    }

    #[test]
    fn test_last_agent_text_wins() {
        let outcome = fold_all(vec![
            StreamEvent::status(TaskState::Working).with_context_id("ctx-1"),
            StreamEvent::agent_message(Some(TaskState::Working), "thinking"),
            StreamEvent::agent_message(Some(TaskState::Working), "3 pods running"),
            StreamEvent::status(TaskState::Completed).with_final(true),
        ])
        .unwrap();

        assert_eq!(outcome.text, "3 pods running");
        assert_eq!(outcome.context_id.as_deref(), Some("ctx-1"));
        assert_eq!(outcome.final_state, Some(TaskState::Completed));
        assert_eq!(outcome.events_seen, 4);
    }

    #[test]
    fn test_newer_context_id_wins() {
        let outcome = fold_all(vec![
            StreamEvent::status(TaskState::Working).with_context_id("ctx-1"),
            StreamEvent::agent_message(Some(TaskState::Completed), "done").with_context_id("ctx-2"),
        ])
        .unwrap();
        assert_eq!(outcome.context_id.as_deref(), Some("ctx-2"));
    }

    #[test]
    fn test_input_required_final_is_success() {
        let outcome = fold_all(vec![
            StreamEvent::agent_message(Some(TaskState::InputRequired), "Which namespace?")
                .with_final(true),
        ])
        .unwrap();
        assert_eq!(outcome.text, "Which namespace?");
        assert_eq!(outcome.final_state, Some(TaskState::InputRequired));
    }

    #[test]
    fn test_completed_without_text_is_empty_success() {
        let outcome = fold_all(vec![StreamEvent::status(TaskState::Completed)]).unwrap();
        assert!(outcome.text.is_empty());
    }

    #[test]
    fn test_failed_state_is_agent_failure() {
        let err = fold_all(vec![
            StreamEvent::agent_message(Some(TaskState::Failed), "tool crashed").with_final(true),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            FoldError::AgentFailed {
                state: "failed".to_string(),
                message: "tool crashed".to_string()
            }
        );
    }

    #[test]
    fn test_error_event_fails() {
        let err = fold_all(vec![
            StreamEvent::status(TaskState::Working),
            StreamEvent::error("Invalid params (-32602)"),
        ])
        .unwrap_err();
        assert_eq!(err, FoldError::ServerError("Invalid params (-32602)".to_string()));
    }

    #[test]
    fn test_stream_ending_early_is_incomplete() {
        let err = fold_all(vec![
            StreamEvent::status(TaskState::Working),
            StreamEvent::agent_message(Some(TaskState::Working), "partial"),
        ])
        .unwrap_err();
        assert_eq!(err, FoldError::Incomplete { events_seen: 2 });
    }

    #[test]
    fn test_only_malformed_payloads() {
        let mut fold = StreamFold::new();
        fold.skip_malformed();
        fold.skip_malformed();
        assert_eq!(fold.finish().unwrap_err(), FoldError::NoValidEvents { skipped: 2 });
    }

    #[test]
    fn test_empty_stream_is_incomplete() {
        assert_eq!(
            StreamFold::new().finish().unwrap_err(),
            FoldError::Incomplete { events_seen: 0 }
        );
    }

    #[test]
    fn test_events_after_terminal_ignored() {
        let mut fold = StreamFold::new();
        assert_eq!(
            fold.push(StreamEvent::agent_message(Some(TaskState::Completed), "first")),
            FoldStep::Done
        );
        assert_eq!(
            fold.push(StreamEvent::agent_message(Some(TaskState::Working), "late")),
            FoldStep::Done
        );
        let outcome = fold.finish().unwrap();
        assert_eq!(outcome.text, "first");
        assert_eq!(outcome.events_seen, 1);
    }

    #[test]
    fn test_state_transitions() {
        let mut fold = StreamFold::new();
        assert_eq!(fold.state(), &FoldState::AwaitingFirstEvent);
        fold.push(StreamEvent::status(TaskState::Submitted));
        assert_eq!(fold.state(), &FoldState::Accumulating);
        fold.push(StreamEvent::status(TaskState::Completed));
        assert_eq!(fold.state(), &FoldState::Terminal);
        assert!(fold.is_done());
    }
}
