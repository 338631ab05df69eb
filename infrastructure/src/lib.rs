//! Infrastructure layer for cluster-relay
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod a2a;
pub mod config;
pub mod logging;
pub mod planner;

// Re-export commonly used types
pub use a2a::{A2aAgentGateway, A2aError, AccessCredentials};
pub use config::{
    ConfigError, ConfigLoader, EnvClusterError, EnvClusters, FileClusterConfig, FileConfig,
    FileOutputConfig, FileReplConfig,
};
pub use logging::JsonlConversationLogger;
pub use planner::{HttpPlanningOracle, MentionPlanner};
