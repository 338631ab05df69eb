//! Structured configuration issues.
//!
//! Loaders report everything they find wrong at once instead of stopping at
//! the first problem. Errors abort startup; warnings are logged.

use std::fmt;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// No cluster is configured.
    NoClusters,
    /// `default_cluster` names a cluster that does not exist.
    UnknownDefaultCluster,
    /// A cluster endpoint is not an http(s) URL.
    InvalidEndpoint,
    /// An alias (or name) is claimed by two clusters.
    DuplicateAlias,
    /// Only one of the access client id / secret is set.
    IncompleteAccessCredentials,
    /// `timeout_seconds` outside the accepted range.
    TimeoutOutOfRange,
    /// `token_limit` outside the accepted range.
    TokenLimitOutOfRange,
    /// The planner URL is not an http(s) URL.
    InvalidPlannerUrl,
    /// `max_parallel` is zero; one task at a time is used instead.
    ZeroParallelism,
}

/// A detected issue in the loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Returns true if any issue is fatal.
pub fn has_errors(issues: &[ConfigIssue]) -> bool {
    issues.iter().any(ConfigIssue::is_error)
}
