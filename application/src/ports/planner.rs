//! Planning oracle port
//!
//! The oracle decomposes a multi-cluster request into per-cluster
//! sub-queries. It is treated as an opaque service with a JSON contract.

use async_trait::async_trait;
use relay_domain::SubQuery;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from the planning oracle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    #[error("planner unavailable: {0}")]
    Unavailable(String),

    #[error("planner did not answer within {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("planner returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Request body sent to the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub utterance: String,
    /// Every configured cluster name, canonical
    pub clusters: Vec<String>,
    /// Clusters the request points at, a subset of `clusters`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
    /// Hint that the user asked for a side-by-side comparison
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub comparison: bool,
}

/// Raw oracle answer; validated into a `Plan` by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(default)]
    pub subqueries: Vec<SubQuery>,
}

#[async_trait]
pub trait PlanningOracle: Send + Sync {
    /// Decompose one request.
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "planner"
    }
}
