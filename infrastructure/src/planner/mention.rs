//! Local planner used when no planning service is configured.
//!
//! Sends the original utterance unchanged to every candidate cluster, or to
//! every configured cluster when the request names none.

use async_trait::async_trait;
use relay_application::{PlanRequest, PlanResponse, PlannerError, PlanningOracle};
use relay_domain::SubQuery;

#[derive(Debug, Default, Clone, Copy)]
pub struct MentionPlanner;

#[async_trait]
impl PlanningOracle for MentionPlanner {
    async fn plan(&self, request: &PlanRequest) -> Result<PlanResponse, PlannerError> {
        let targets = if request.candidates.is_empty() {
            &request.clusters
        } else {
            &request.candidates
        };
        Ok(PlanResponse {
            subqueries: targets
                .iter()
                .map(|cluster| SubQuery::new(cluster.clone(), request.utterance.clone()))
                .collect(),
        })
    }

    fn name(&self) -> &str {
        "mention"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_subquery_per_candidate() {
        let request = PlanRequest {
            utterance: "pod count on dev and prod".to_string(),
            clusters: vec!["dev".to_string(), "test".to_string(), "prod".to_string()],
            candidates: vec!["dev".to_string(), "prod".to_string()],
            comparison: false,
        };
        let response = MentionPlanner.plan(&request).await.unwrap();
        assert_eq!(
            response.subqueries,
            vec![
                SubQuery::new("dev", "pod count on dev and prod"),
                SubQuery::new("prod", "pod count on dev and prod"),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_candidates_targets_every_cluster() {
        let request = PlanRequest {
            utterance: "nodes".to_string(),
            clusters: vec!["dev".to_string(), "prod".to_string()],
            candidates: Vec::new(),
            comparison: false,
        };
        let response = MentionPlanner.plan(&request).await.unwrap();
        assert_eq!(
            response.subqueries,
            vec![SubQuery::new("dev", "nodes"), SubQuery::new("prod", "nodes")]
        );
    }
}
