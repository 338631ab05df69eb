//! Plans produced by the planning oracle.
//!
//! A [`Plan`] is only ever constructed through [`Plan::validate`], which
//! rejects the whole decomposition if any part of it is unusable.

use crate::cluster::registry::ClusterRegistry;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// One per-cluster part of a decomposed request, as returned by the oracle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubQuery {
    pub cluster: String,
    pub query: String,
}

impl SubQuery {
    pub fn new(cluster: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            query: query.into(),
        }
    }
}

/// A validated, ordered decomposition of a multi-cluster request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    subqueries: Vec<SubQuery>,
}

impl Plan {
    /// Validate raw sub-queries against the registry.
    ///
    /// Cluster names must be canonical (compared case-insensitively); aliases
    /// are not resolved here.
    pub fn validate(
        subqueries: Vec<SubQuery>,
        registry: &ClusterRegistry,
    ) -> Result<Self, DomainError> {
        if subqueries.is_empty() {
            return Err(DomainError::InvalidPlan("plan has no sub-queries".to_string()));
        }
        if subqueries.len() > registry.len() {
            return Err(DomainError::InvalidPlan(format!(
                "plan has {} sub-queries but only {} clusters are configured",
                subqueries.len(),
                registry.len()
            )));
        }

        let mut validated: Vec<SubQuery> = Vec::with_capacity(subqueries.len());
        for sub in subqueries {
            let cluster = sub.cluster.trim().to_lowercase();
            if !registry.contains(&cluster) {
                return Err(DomainError::InvalidPlan(format!(
                    "unknown cluster '{}'",
                    sub.cluster
                )));
            }
            if validated.iter().any(|v| v.cluster == cluster) {
                return Err(DomainError::InvalidPlan(format!(
                    "cluster '{cluster}' appears more than once"
                )));
            }
            let query = sub.query.trim();
            if query.is_empty() {
                return Err(DomainError::InvalidPlan(format!(
                    "empty query for cluster '{cluster}'"
                )));
            }
            validated.push(SubQuery::new(cluster, query));
        }

        Ok(Self {
            subqueries: validated,
        })
    }

    pub fn subqueries(&self) -> &[SubQuery] {
        &self.subqueries
    }

    pub fn clusters(&self) -> Vec<&str> {
        self.subqueries.iter().map(|s| s.cluster.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.subqueries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subqueries.is_empty()
    }
}

impl IntoIterator for Plan {
    type Item = SubQuery;
    type IntoIter = std::vec::IntoIter<SubQuery>;

    fn into_iter(self) -> Self::IntoIter {
        self.subqueries.into_iter()
    }
}

/// Extract sub-queries from an oracle response body.
///
/// Accepts the bare JSON contract (`{"subqueries": [...]}`), or the same
/// object inside a ` ```json ` / ` ```plan ` fenced block. Returns `None`
/// when no such object can be found.
pub fn parse_plan(body: &str) -> Option<Vec<SubQuery>> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body.trim()) {
        return parse_plan_json(&value);
    }

    let mut in_block = false;
    let mut block = String::new();
    for line in body.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```plan") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            in_block = false;
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(&block)
                && let Some(subqueries) = parse_plan_json(&value)
            {
                return Some(subqueries);
            }
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }
    None
}

/// Read sub-queries from a JSON value of the form
/// `{"subqueries": [{"cluster": "...", "query": "..."}]}`.
///
/// Entries missing either field are kept with an empty string so that
/// [`Plan::validate`] rejects the plan instead of silently shrinking it.
pub fn parse_plan_json(json: &serde_json::Value) -> Option<Vec<SubQuery>> {
    let entries = json.get("subqueries")?.as_array()?;
    Some(
        entries
            .iter()
            .map(|entry| {
                let field = |name: &str| {
                    entry
                        .get(name)
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string()
                };
                SubQuery::new(field("cluster"), field("query"))
            })
            .collect(),
    )
}
