//! Orchestrate use case
//!
//! Routes one inbound utterance to one cluster, or plans, maps and reduces
//! it across several clusters.

use crate::config::RelayParams;
use crate::context_store::ContextStore;
use crate::ports::agent_gateway::{AgentGateway, ExchangeError, ExchangeReply, ExchangeRequest};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger, events,
};
use crate::ports::planner::{PlanRequest, PlanningOracle};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use relay_domain::{
    ClusterRegistry, ContextKey, FailureKind, Plan, RequestKind, SubResult, classify,
    estimate_exchange, failures, log_safe, synthesize,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Errors that end a request without an answer
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error(
        "The conversation with {cluster} is too large ({tokens} of {limit} estimated tokens). \
         Reset it with `reset {cluster}` to start a new one."
    )]
    OverBudget {
        cluster: String,
        tokens: u64,
        limit: u64,
    },

    #[error("{cluster}: {source}")]
    Exchange {
        cluster: String,
        #[source]
        source: ExchangeError,
    },

    #[error("All clusters failed: {}", describe_failures(.failures))]
    AllClustersFailed { failures: Vec<(String, FailureKind)> },

    #[error("Could not plan the request: {0}")]
    InvalidPlan(String),
}

impl OrchestrateError {
    /// Failure label for a single-cluster error, if it has one.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            OrchestrateError::OverBudget { .. } => Some(FailureKind::OverBudget),
            OrchestrateError::Exchange { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

fn describe_failures(failures: &[(String, FailureKind)]) -> String {
    failures
        .iter()
        .map(|(cluster, kind)| format!("{cluster}: {kind}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Input for the Orchestrate use case
#[derive(Debug, Clone)]
pub struct OrchestrateInput {
    /// Chat thread the utterance belongs to
    pub thread_id: String,
    pub utterance: String,
}

impl OrchestrateInput {
    pub fn new(thread_id: impl Into<String>, utterance: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            utterance: utterance.into(),
        }
    }
}

/// Which path produced a reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum ReplyKind {
    Single { cluster: String },
    Multi { results: Vec<SubResult> },
}

/// The answer handed back to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayReply {
    pub text: String,
    #[serde(flatten)]
    pub kind: ReplyKind,
    /// A multi-cluster request was answered by the default cluster because
    /// planning failed
    pub fallback: bool,
}

/// Runs exchanges against one context at a time; cloned into map tasks.
struct Dispatcher<G: AgentGateway + 'static> {
    gateway: Arc<G>,
    store: Arc<ContextStore>,
    logger: Arc<dyn ConversationLogger>,
    timeout: Duration,
}

impl<G: AgentGateway + 'static> Clone for Dispatcher<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            store: Arc::clone(&self.store),
            logger: Arc::clone(&self.logger),
            timeout: self.timeout,
        }
    }
}

impl<G: AgentGateway + 'static> Dispatcher<G> {
    /// One exchange on `key`, serialized with any other exchange on the same
    /// key. The context is updated only on success and only if it was not
    /// reset in the meantime.
    async fn exchange(
        &self,
        key: ContextKey,
        endpoint: String,
        query: String,
    ) -> Result<ExchangeReply, ExchangeError> {
        let lease = self.store.begin_exchange(&key).await;
        let request = ExchangeRequest {
            endpoint,
            query,
            context_id: lease.protocol_context_id().map(str::to_string),
            timeout: self.timeout,
        };

        debug!(
            key = %key,
            context_id = request.context_id.as_deref().unwrap_or("-"),
            "Starting exchange"
        );
        self.logger.log(ConversationEvent::new(
            events::EXCHANGE_STARTED,
            json!({
                "thread_id": key.thread_id,
                "cluster": key.cluster,
                "context_id": request.context_id,
                "query": request.query,
            }),
        ));

        let result = self.gateway.exchange(&request, lease.cancellation()).await;
        let result = result.and_then(|reply| {
            let tokens = estimate_exchange(&request.query, &reply.text) as u64;
            if self
                .store
                .record_exchange(&lease, reply.context_id.as_deref(), tokens)
            {
                Ok(reply)
            } else {
                Err(ExchangeError::Cancelled)
            }
        });

        match &result {
            Ok(reply) => {
                info!(
                    key = %key,
                    events = reply.events_seen,
                    context_id = reply.context_id.as_deref().unwrap_or("-"),
                    "Exchange completed"
                );
                self.logger.log(ConversationEvent::new(
                    events::EXCHANGE_COMPLETED,
                    json!({
                        "thread_id": key.thread_id,
                        "cluster": key.cluster,
                        "context_id": reply.context_id,
                        "final_state": reply.final_state.as_ref().map(|s| s.to_string()),
                        "text": reply.text,
                    }),
                ));
            }
            Err(e) => {
                warn!(key = %key, kind = %e.kind(), "Exchange failed: {}", e);
                self.logger.log(ConversationEvent::new(
                    events::EXCHANGE_FAILED,
                    json!({
                        "thread_id": key.thread_id,
                        "cluster": key.cluster,
                        "kind": e.kind().label(),
                        "error": e.to_string(),
                    }),
                ));
            }
        }
        result
    }
}

/// Use case for answering one utterance
pub struct OrchestrateUseCase<G: AgentGateway + 'static> {
    gateway: Arc<G>,
    planner: Arc<dyn PlanningOracle>,
    registry: Arc<ClusterRegistry>,
    store: Arc<ContextStore>,
    logger: Arc<dyn ConversationLogger>,
    params: RelayParams,
    fallback_on_plan_failure: bool,
}

impl<G: AgentGateway + 'static> OrchestrateUseCase<G> {
    pub fn new(
        gateway: Arc<G>,
        planner: Arc<dyn PlanningOracle>,
        registry: Arc<ClusterRegistry>,
        store: Arc<ContextStore>,
    ) -> Self {
        Self {
            gateway,
            planner,
            registry,
            store,
            logger: Arc::new(NoConversationLogger),
            params: RelayParams::default(),
            fallback_on_plan_failure: true,
        }
    }

    pub fn with_params(mut self, params: RelayParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// When disabled, a rejected plan fails the request with
    /// [`OrchestrateError::InvalidPlan`] instead of asking the default cluster.
    pub fn with_plan_fallback(mut self, enabled: bool) -> Self {
        self.fallback_on_plan_failure = enabled;
        self
    }

    pub fn registry(&self) -> &ClusterRegistry {
        &self.registry
    }

    fn dispatcher(&self) -> Dispatcher<G> {
        Dispatcher {
            gateway: Arc::clone(&self.gateway),
            store: Arc::clone(&self.store),
            logger: Arc::clone(&self.logger),
            timeout: self.params.exchange_timeout,
        }
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: OrchestrateInput) -> Result<RelayReply, OrchestrateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: OrchestrateInput,
        progress: &dyn ProgressNotifier,
    ) -> Result<RelayReply, OrchestrateError> {
        let kind = classify(&input.utterance, &self.registry);
        info!(
            thread = %input.thread_id,
            multi = kind.is_multi(),
            "Routing request: {}",
            log_safe(&input.utterance)
        );
        progress.on_route(&kind);

        match kind {
            RequestKind::Single { cluster, .. } => {
                let text = self.single(&input, &cluster, progress).await?;
                Ok(RelayReply {
                    text,
                    kind: ReplyKind::Single { cluster },
                    fallback: false,
                })
            }
            RequestKind::Multi {
                candidates,
                comparison,
            } => match self.plan(&input, candidates, comparison).await {
                Ok(plan) => self.map_reduce(&input, plan, comparison, progress).await,
                Err(reason) => {
                    warn!(thread = %input.thread_id, "Plan rejected: {}", reason);
                    self.logger.log(ConversationEvent::new(
                        events::PLAN_REJECTED,
                        json!({ "thread_id": input.thread_id, "reason": reason }),
                    ));
                    progress.on_plan_rejected(&reason);

                    if !self.fallback_on_plan_failure {
                        return Err(OrchestrateError::InvalidPlan(reason));
                    }
                    let cluster = self.registry.default_cluster().name().to_string();
                    let text = self.single(&input, &cluster, progress).await?;
                    Ok(RelayReply {
                        text,
                        kind: ReplyKind::Single { cluster },
                        fallback: true,
                    })
                }
            },
        }
    }

    /// Single path: budget check, then one exchange.
    async fn single(
        &self,
        input: &OrchestrateInput,
        cluster: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<String, OrchestrateError> {
        let key = ContextKey::new(&input.thread_id, cluster);
        self.check_budget(&key)?;

        let endpoint = self
            .registry
            .get(cluster)
            .map(|c| c.endpoint().to_string())
            .ok_or_else(|| OrchestrateError::Exchange {
                cluster: cluster.to_string(),
                source: ExchangeError::Unknown(format!("cluster '{cluster}' is not configured")),
            })?;

        progress.on_dispatch(cluster);
        self.dispatcher()
            .exchange(key, endpoint, input.utterance.clone())
            .await
            .map(|reply| reply.text)
            .map_err(|source| OrchestrateError::Exchange {
                cluster: cluster.to_string(),
                source,
            })
    }

    fn check_budget(&self, key: &ContextKey) -> Result<(), OrchestrateError> {
        let limit = self.params.token_limit;
        if self.store.is_over_budget(key, limit) {
            let tokens = self
                .store
                .get(key)
                .map(|c| c.token_estimate())
                .unwrap_or(limit);
            return Err(OrchestrateError::OverBudget {
                cluster: key.cluster.clone(),
                tokens,
                limit,
            });
        }
        Ok(())
    }

    /// Ask the oracle for a plan and validate it. Any failure rejects the
    /// plan as a whole.
    async fn plan(
        &self,
        input: &OrchestrateInput,
        candidates: Vec<String>,
        comparison: bool,
    ) -> Result<Plan, String> {
        let request = PlanRequest {
            utterance: input.utterance.clone(),
            clusters: self.registry.names(),
            candidates,
            comparison,
        };
        debug!(
            planner = self.planner.name(),
            candidates = ?request.candidates,
            "Requesting plan"
        );

        let timeout = self.params.planner_timeout;
        let response = match tokio::time::timeout(timeout, self.planner.plan(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => {
                return Err(format!(
                    "planner did not answer within {}s",
                    timeout.as_secs()
                ));
            }
        };

        let plan = Plan::validate(response.subqueries, &self.registry).map_err(|e| e.to_string())?;
        self.logger.log(ConversationEvent::new(
            events::PLAN_GENERATED,
            json!({
                "thread_id": input.thread_id,
                "planner": self.planner.name(),
                "subqueries": plan.subqueries(),
            }),
        ));
        Ok(plan)
    }

    /// Map the plan onto concurrent exchanges and reduce the results.
    async fn map_reduce(
        &self,
        input: &OrchestrateInput,
        plan: Plan,
        comparison: bool,
        progress: &dyn ProgressNotifier,
    ) -> Result<RelayReply, OrchestrateError> {
        info!(thread = %input.thread_id, clusters = ?plan.clusters(), "Dispatching plan");
        progress.on_plan(&plan);

        let semaphore = Arc::new(Semaphore::new(
            self.params.parallelism(self.registry.len()),
        ));
        let clusters: Vec<String> = plan.clusters().iter().map(|c| c.to_string()).collect();
        let mut results: Vec<Option<SubResult>> = vec![None; plan.len()];
        let mut join_set = JoinSet::new();

        for (index, sub) in plan.into_iter().enumerate() {
            let key = ContextKey::new(&input.thread_id, &sub.cluster);
            if let Err(e) = self.check_budget(&key) {
                let result = SubResult::failed(&sub.cluster, FailureKind::OverBudget, e.to_string());
                progress.on_sub_result(&result);
                results[index] = Some(result);
                continue;
            }
            let Some(endpoint) = self.registry.get(&sub.cluster).map(|c| c.endpoint().to_string())
            else {
                results[index] = Some(SubResult::failed(
                    &sub.cluster,
                    FailureKind::Unknown,
                    "cluster is not configured",
                ));
                continue;
            };

            progress.on_dispatch(&sub.cluster);
            let dispatcher = self.dispatcher();
            let semaphore = Arc::clone(&semaphore);
            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let outcome = dispatcher.exchange(key, endpoint, sub.query).await;
                (index, sub.cluster, outcome)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, cluster, Ok(reply))) => {
                    let result = SubResult::ok(cluster, reply.text);
                    progress.on_sub_result(&result);
                    results[index] = Some(result);
                }
                Ok((index, cluster, Err(e))) => {
                    let result = SubResult::failed(cluster, e.kind(), e.to_string());
                    progress.on_sub_result(&result);
                    results[index] = Some(result);
                }
                Err(e) => {
                    warn!("Sub-query task join error: {}", e);
                }
            }
        }

        let results: Vec<SubResult> = results
            .into_iter()
            .zip(clusters)
            .map(|(result, cluster)| {
                result.unwrap_or_else(|| {
                    SubResult::failed(cluster, FailureKind::Unknown, "sub-query task aborted")
                })
            })
            .collect();

        let failed = failures(&results);
        progress.on_reduce(results.len() - failed.len(), failed.len());

        match synthesize(&results, comparison) {
            Some(text) => Ok(RelayReply {
                text,
                kind: ReplyKind::Multi { results },
                fallback: false,
            }),
            None => Err(OrchestrateError::AllClustersFailed { failures: failed }),
        }
    }
}
