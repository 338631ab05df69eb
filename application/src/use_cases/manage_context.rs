//! Manage context use case
//!
//! Executes operator commands (`reset`, `status`) against the context store.

use crate::context_store::ContextStore;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, events,
};
use relay_domain::{ClusterRegistry, ContextCommand, ContextKey, ContextSnapshot};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManageContextError {
    #[error("Unknown cluster '{term}'. Known clusters: {}", .known.join(", "))]
    UnknownCluster { term: String, known: Vec<String> },
}

/// One line of a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextStatus {
    #[serde(flatten)]
    pub snapshot: ContextSnapshot,
    pub budget_used_pct: u8,
}

/// Result of a context command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ContextOutcome {
    /// Clusters whose conversation was discarded (empty if none existed)
    Reset { clusters: Vec<String> },
    Status { contexts: Vec<ContextStatus> },
}

pub struct ManageContextUseCase {
    store: Arc<ContextStore>,
    registry: Arc<ClusterRegistry>,
    logger: Arc<dyn ConversationLogger>,
    token_limit: u64,
}

impl ManageContextUseCase {
    pub fn new(store: Arc<ContextStore>, registry: Arc<ClusterRegistry>, token_limit: u64) -> Self {
        Self {
            store,
            registry,
            logger: Arc::new(NoConversationLogger),
            token_limit,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn execute(
        &self,
        thread_id: &str,
        command: &ContextCommand,
    ) -> Result<ContextOutcome, ManageContextError> {
        match command {
            ContextCommand::Reset { cluster: Some(term) } => {
                let cluster = self
                    .registry
                    .resolve(term)
                    .map(|c| c.name().to_string())
                    .ok_or_else(|| ManageContextError::UnknownCluster {
                        term: term.clone(),
                        known: self.registry.names(),
                    })?;
                let clusters = if self.store.reset(&ContextKey::new(thread_id, &cluster)) {
                    vec![cluster]
                } else {
                    Vec::new()
                };
                self.log_reset(thread_id, &clusters);
                Ok(ContextOutcome::Reset { clusters })
            }
            ContextCommand::Reset { cluster: None } => {
                let clusters = self.store.reset_thread(thread_id);
                self.log_reset(thread_id, &clusters);
                Ok(ContextOutcome::Reset { clusters })
            }
            ContextCommand::Status => Ok(ContextOutcome::Status {
                contexts: self.status(thread_id),
            }),
        }
    }

    /// Every active conversation of the thread with its budget usage.
    pub fn status(&self, thread_id: &str) -> Vec<ContextStatus> {
        self.store
            .status(thread_id)
            .into_iter()
            .map(|snapshot| ContextStatus {
                budget_used_pct: snapshot.budget_used_pct(self.token_limit),
                snapshot,
            })
            .collect()
    }

    fn log_reset(&self, thread_id: &str, clusters: &[String]) {
        info!(thread = %thread_id, ?clusters, "Context reset");
        self.logger.log(ConversationEvent::new(
            events::CONTEXT_RESET,
            json!({ "thread_id": thread_id, "clusters": clusters }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::ClusterConfig;

    fn setup() -> (ManageContextUseCase, Arc<ContextStore>) {
        let registry = Arc::new(
            ClusterRegistry::new(vec![
                ClusterConfig::new("dev", "http://dev/", ["development"]),
                ClusterConfig::new("prod", "http://prod/", ["production"]),
            ])
            .unwrap(),
        );
        let store = Arc::new(ContextStore::new());
        (
            ManageContextUseCase::new(Arc::clone(&store), registry, 1000),
            store,
        )
    }

    async fn exchange(store: &ContextStore, thread: &str, cluster: &str, tokens: u64) {
        let lease = store.begin_exchange(&ContextKey::new(thread, cluster)).await;
        store.record_exchange(&lease, Some("ctx"), tokens);
    }

    #[tokio::test]
    async fn test_reset_by_alias() {
        let (uc, store) = setup();
        exchange(&store, "t1", "prod", 10).await;

        let outcome = uc
            .execute(
                "t1",
                &ContextCommand::Reset {
                    cluster: Some("production".into()),
                },
            )
            .unwrap();
        assert_eq!(
            outcome,
            ContextOutcome::Reset {
                clusters: vec!["prod".into()]
            }
        );
        assert!(store.get(&ContextKey::new("t1", "prod")).is_none());
    }

    #[tokio::test]
    async fn test_reset_all_of_thread_only() {
        let (uc, store) = setup();
        exchange(&store, "t1", "dev", 10).await;
        exchange(&store, "t1", "prod", 10).await;
        exchange(&store, "t2", "dev", 10).await;

        let outcome = uc
            .execute("t1", &ContextCommand::Reset { cluster: None })
            .unwrap();
        assert_eq!(
            outcome,
            ContextOutcome::Reset {
                clusters: vec!["dev".into(), "prod".into()]
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_reset_unknown_cluster() {
        let (uc, _) = setup();
        let err = uc
            .execute(
                "t1",
                &ContextCommand::Reset {
                    cluster: Some("staging".into()),
                },
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown cluster 'staging'. Known clusters: dev, prod"
        );
    }

    #[tokio::test]
    async fn test_status_reports_budget() {
        let (uc, store) = setup();
        exchange(&store, "t1", "dev", 250).await;

        let ContextOutcome::Status { contexts } = uc.execute("t1", &ContextCommand::Status).unwrap()
        else {
            panic!("expected status");
        };
        assert_eq!(contexts.len(), 1);
        assert_eq!(contexts[0].snapshot.cluster, "dev");
        assert_eq!(contexts[0].snapshot.message_count, 1);
        assert_eq!(contexts[0].budget_used_pct, 25);
        assert!(uc.status("t2").is_empty());
    }
}
