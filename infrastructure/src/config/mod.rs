//! Configuration loading for cluster-relay
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. Cluster environment scheme (`RELAY_CLUSTERS`, `RELAY_A2A_URL`)
//! 2. `RELAY_*` environment variables
//! 3. `--config <path>` specified file
//! 4. Project root: `./relay.toml` or `./.relay.toml`
//! 5. XDG config: `$XDG_CONFIG_HOME/cluster-relay/config.toml`
//! 6. Default values

mod env_clusters;
mod file_config;
mod loader;

pub use env_clusters::{EnvClusterError, EnvClusters, default_aliases};
pub use file_config::{
    FileAccessConfig, FileClusterConfig, FileConfig, FileLoggingConfig, FileOutputConfig,
    FilePlannerConfig, FileReplConfig, expand_home,
};
pub use loader::{ConfigError, ConfigLoader};
