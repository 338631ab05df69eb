//! Progress notification port
//!
//! Defines the interface for reporting progress while a request is routed,
//! planned, dispatched and reduced.

use relay_domain::{Plan, RequestKind, SubResult};

/// Callback for progress updates during orchestration
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (spinner, plain log lines, etc.)
pub trait ProgressNotifier: Send + Sync {
    /// Called once the request has been classified
    fn on_route(&self, kind: &RequestKind);

    /// Called when an exchange to `cluster` starts
    fn on_dispatch(&self, cluster: &str);

    /// Called as each sub-query of a plan finishes
    fn on_sub_result(&self, result: &SubResult);

    /// Called with the validated plan before the map step
    fn on_plan(&self, _plan: &Plan) {}

    /// Called when the plan was rejected and the default cluster is used
    fn on_plan_rejected(&self, _reason: &str) {}

    /// Called after the reduce step
    fn on_reduce(&self, _succeeded: usize, _failed: usize) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_route(&self, _kind: &RequestKind) {}
    fn on_dispatch(&self, _cluster: &str) {}
    fn on_sub_result(&self, _result: &SubResult) {}
}
