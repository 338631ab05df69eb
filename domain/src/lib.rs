//! Domain layer for cluster-relay
//!
//! This crate contains the core logic for routing conversational requests to
//! per-cluster agents. It has no dependencies on infrastructure or
//! presentation concerns.
//!
//! # Core Concepts
//!
//! ## Clusters
//!
//! A [`ClusterRegistry`] holds every configured cluster with its endpoint and
//! aliases. The [`ClusterRouter`] maps free text to a cluster by whole-word
//! lookup in the registry's alias index.
//!
//! ## Conversations
//!
//! One [`ConversationContext`] exists per (thread, cluster) pair and carries
//! the remote agent's context id plus message and token counters.
//!
//! ## Orchestration
//!
//! Requests are classified once into [`RequestKind::Single`] or
//! [`RequestKind::Multi`]. Multi-cluster requests are decomposed into a
//! validated [`Plan`], mapped to [`SubResult`]s and reduced by
//! [`synthesize`].

pub mod cluster;
pub mod config;
pub mod conversation;
pub mod core;
pub mod exchange;
pub mod orchestration;

pub use cluster::{
    entities::ClusterConfig,
    registry::ClusterRegistry,
    router::{ClusterMatch, ClusterRouter},
};
pub use config::{
    OutputFormat,
    validation::{ConfigIssue, ConfigIssueCode, Severity, has_errors},
};
pub use conversation::{
    command::ContextCommand,
    entities::{ContextIdChange, ContextKey, ContextSnapshot, ConversationContext},
};
pub use core::{
    error::DomainError,
    string::{log_safe, truncate},
    tokens::{estimate_exchange, estimate_tokens},
};
pub use exchange::{
    fold::{FoldError, FoldOutcome, FoldState, FoldStep, StreamFold},
    stream::{EventKind, StreamEvent, TaskState},
};
pub use orchestration::{
    classify::{RequestKind, classify},
    plan::{Plan, SubQuery, parse_plan, parse_plan_json},
    synthesis::{failures, synthesize},
    value_objects::{FailureKind, SubResult, SubResultStatus},
};
