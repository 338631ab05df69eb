//! Agent Gateway port
//!
//! Defines the interface for exchanging messages with a remote cluster agent.

use async_trait::async_trait;
use relay_domain::{FailureKind, FoldError, TaskState};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Typed failure of one exchange.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    #[error("cluster agent unreachable: {0}")]
    Unreachable(String),

    #[error("cluster agent rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("no answer within {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("malformed event stream: {0}")]
    Malformed(String),

    #[error("agent reported {state}: {message}")]
    AgentFailed { state: String, message: String },

    #[error("exchange cancelled")]
    Cancelled,

    #[error("exchange failed: {0}")]
    Unknown(String),
}

impl ExchangeError {
    /// Stable label for user-facing output.
    pub fn kind(&self) -> FailureKind {
        match self {
            ExchangeError::Unreachable(_) => FailureKind::Unreachable,
            ExchangeError::Rejected { .. } => FailureKind::Rejected,
            ExchangeError::TimedOut(_) => FailureKind::TimedOut,
            ExchangeError::Malformed(_) => FailureKind::Malformed,
            ExchangeError::AgentFailed { .. } => FailureKind::AgentFailed,
            ExchangeError::Cancelled => FailureKind::Cancelled,
            ExchangeError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

impl From<FoldError> for ExchangeError {
    fn from(err: FoldError) -> Self {
        match err {
            FoldError::NoValidEvents { .. } | FoldError::Incomplete { .. } => {
                ExchangeError::Malformed(err.to_string())
            }
            FoldError::AgentFailed { state, message } => {
                ExchangeError::AgentFailed { state, message }
            }
            FoldError::ServerError(message) => ExchangeError::AgentFailed {
                state: "error".to_string(),
                message,
            },
        }
    }
}

/// One exchange to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRequest {
    pub endpoint: String,
    pub query: String,
    /// Correlation id of the remote conversation; `None` starts a new one
    pub context_id: Option<String>,
    pub timeout: Duration,
}

/// Final answer of one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReply {
    pub text: String,
    /// Context id echoed (or newly issued) by the agent
    pub context_id: Option<String>,
    pub events_seen: usize,
    pub final_state: Option<TaskState>,
}

/// A skill advertised in an agent card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSkill {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Agent identity served at the discovery endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub skills: Vec<AgentSkill>,
}

/// Gateway to the per-cluster agents
///
/// This port defines how the application layer talks to remote agents.
/// Implementations (adapters) live in the infrastructure layer and must
/// enforce `request.timeout` and stop as soon as `cancel` fires.
#[async_trait]
pub trait AgentGateway: Send + Sync {
    /// Run one streaming exchange and return the agent's final answer.
    async fn exchange(
        &self,
        request: &ExchangeRequest,
        cancel: CancellationToken,
    ) -> Result<ExchangeReply, ExchangeError>;

    /// Fetch the agent card of an endpoint.
    async fn discover(&self, endpoint: &str) -> Result<AgentCard, ExchangeError>;
}
