//! Outcome types of the map step.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, user-facing label for why a cluster produced no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Unreachable,
    Rejected,
    TimedOut,
    Malformed,
    AgentFailed,
    Cancelled,
    OverBudget,
    Unknown,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Unreachable => "unreachable",
            FailureKind::Rejected => "rejected",
            FailureKind::TimedOut => "timed_out",
            FailureKind::Malformed => "malformed",
            FailureKind::AgentFailed => "agent_failed",
            FailureKind::Cancelled => "cancelled",
            FailureKind::OverBudget => "over_budget",
            FailureKind::Unknown => "unknown",
        }
    }

    /// Short explanation shown next to the cluster name.
    pub fn describe(&self) -> &'static str {
        match self {
            FailureKind::Unreachable => "unreachable (could not connect to the cluster agent)",
            FailureKind::Rejected => "rejected (the cluster agent returned an error status)",
            FailureKind::TimedOut => "timed out (no answer within the deadline)",
            FailureKind::Malformed => "malformed response (the event stream could not be read)",
            FailureKind::AgentFailed => "agent failed (the cluster agent reported a failure)",
            FailureKind::Cancelled => "cancelled (the conversation was reset)",
            FailureKind::OverBudget => "conversation too large (reset this cluster's context)",
            FailureKind::Unknown => "failed (unknown error)",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Status of one sub-query after the map step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubResultStatus {
    Ok,
    Failed,
    TimedOut,
}

/// Outcome of one sub-query. `text` is present iff the status is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubResult {
    pub cluster: String,
    pub status: SubResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Transport detail for logs; never shown in the reduced answer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SubResult {
    pub fn ok(cluster: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            status: SubResultStatus::Ok,
            text: Some(text.into()),
            failure: None,
            detail: None,
        }
    }

    pub fn failed(cluster: impl Into<String>, kind: FailureKind, detail: impl Into<String>) -> Self {
        let status = if kind == FailureKind::TimedOut {
            SubResultStatus::TimedOut
        } else {
            SubResultStatus::Failed
        };
        Self {
            cluster: cluster.into(),
            status,
            text: None,
            failure: Some(kind),
            detail: Some(detail.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SubResultStatus::Ok
    }

    /// The failure label, `None` for successful results.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.status {
            SubResultStatus::Ok => None,
            SubResultStatus::TimedOut => Some(FailureKind::TimedOut),
            SubResultStatus::Failed => Some(self.failure.unwrap_or(FailureKind::Unknown)),
        }
    }
}
