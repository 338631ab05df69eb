//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No clusters configured")]
    EmptyRegistry,

    #[error("Unknown cluster: {0}")]
    UnknownCluster(String),

    #[error("Duplicate cluster name: {0}")]
    DuplicateCluster(String),

    #[error("Alias '{alias}' is claimed by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DomainError {
    /// Check if this error was caused by a rejected plan
    pub fn is_invalid_plan(&self) -> bool {
        matches!(self, DomainError::InvalidPlan(_))
    }
}
