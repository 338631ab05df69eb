//! Relay parameters: budgets, deadlines and fan-out width.
//!
//! [`RelayParams`] groups the static parameters that control
//! [`OrchestrateUseCase`](crate::use_cases::orchestrate::OrchestrateUseCase).
//! They are loaded once at startup and never change during a session.

use std::time::Duration;

/// Default per-exchange deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
/// Default conversation size ceiling in estimated tokens.
pub const DEFAULT_TOKEN_LIMIT: u64 = 300_000;
/// Default upper bound on concurrent sub-queries.
pub const DEFAULT_MAX_PARALLEL: usize = 8;
/// Default deadline for one planner call.
pub const DEFAULT_PLANNER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayParams {
    /// A context at or above this estimate refuses new exchanges.
    pub token_limit: u64,
    /// Deadline for one exchange, connect and stream included.
    pub exchange_timeout: Duration,
    /// Upper bound on concurrent sub-queries; further capped by the
    /// number of configured clusters.
    pub max_parallel: usize,
    /// Deadline for one planning oracle call.
    pub planner_timeout: Duration,
}

impl Default for RelayParams {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            exchange_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_parallel: DEFAULT_MAX_PARALLEL,
            planner_timeout: Duration::from_secs(DEFAULT_PLANNER_TIMEOUT_SECS),
        }
    }
}

impl RelayParams {
    // ==================== Builder Methods ====================

    pub fn with_token_limit(mut self, limit: u64) -> Self {
        self.token_limit = limit;
        self
    }

    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel = max;
        self
    }

    pub fn with_planner_timeout(mut self, timeout: Duration) -> Self {
        self.planner_timeout = timeout;
        self
    }

    /// Concurrency for a plan given the registry size; never zero.
    pub fn parallelism(&self, cluster_count: usize) -> usize {
        self.max_parallel.min(cluster_count).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = RelayParams::default();
        assert_eq!(params.token_limit, 300_000);
        assert_eq!(params.exchange_timeout, Duration::from_secs(300));
        assert_eq!(params.max_parallel, 8);
        assert_eq!(params.planner_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_parallelism_capped_by_clusters() {
        let params = RelayParams::default();
        assert_eq!(params.parallelism(3), 3);
        assert_eq!(params.parallelism(20), 8);
        assert_eq!(params.with_max_parallel(0).parallelism(3), 1);
    }

    #[test]
    fn test_builder() {
        let params = RelayParams::default()
            .with_token_limit(10_000)
            .with_exchange_timeout(Duration::from_secs(60));
        assert_eq!(params.token_limit, 10_000);
        assert_eq!(params.exchange_timeout, Duration::from_secs(60));
    }
}
