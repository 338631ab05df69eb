//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod access;
mod clusters;
mod logging;
mod output;
mod planner;
mod repl;

pub use access::FileAccessConfig;
pub use clusters::{FileClusterConfig, is_http_url};
pub use logging::{FileLoggingConfig, expand_home};
pub use output::FileOutputConfig;
pub use planner::FilePlannerConfig;
pub use repl::FileReplConfig;

use relay_application::RelayParams;
use relay_application::config::relay_params::{
    DEFAULT_MAX_PARALLEL, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_LIMIT,
};
use relay_domain::cluster::entities::{normalize_term, term_key};
use relay_domain::{ClusterRegistry, ConfigIssue, ConfigIssueCode, DomainError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Accepted per-exchange deadline, in seconds.
pub const TIMEOUT_RANGE: RangeInclusive<u64> = 30..=600;
/// Accepted token ceiling.
pub const TOKEN_LIMIT_RANGE: RangeInclusive<u64> = 10_000..=400_000;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Cluster answering requests that name no cluster; first registered if unset
    pub default_cluster: Option<String>,
    /// Conversation size ceiling in estimated tokens
    pub token_limit: u64,
    /// Deadline for one exchange
    pub timeout_seconds: u64,
    /// Upper bound on concurrent sub-queries
    pub max_parallel: usize,
    /// Clusters keyed by canonical name
    pub clusters: BTreeMap<String, FileClusterConfig>,
    /// Registration order of `clusters` when it is not alphabetical
    /// (set by the environment cluster scheme)
    #[serde(skip)]
    pub cluster_order: Vec<String>,
    /// Planning oracle settings
    pub planner: FilePlannerConfig,
    /// Access-proxy headers
    pub access: FileAccessConfig,
    /// Transcript settings
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            default_cluster: None,
            token_limit: DEFAULT_TOKEN_LIMIT,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_parallel: DEFAULT_MAX_PARALLEL,
            clusters: BTreeMap::new(),
            cluster_order: Vec::new(),
            planner: FilePlannerConfig::default(),
            access: FileAccessConfig::default(),
            logging: FileLoggingConfig::default(),
            output: FileOutputConfig::default(),
            repl: FileReplConfig::default(),
        }
    }
}

impl FileConfig {
    /// Cluster entries in registration order: names listed in
    /// `cluster_order` first, the remaining ones alphabetically.
    pub fn ordered_clusters(&self) -> Vec<(&str, &FileClusterConfig)> {
        let mut ordered: Vec<(&str, &FileClusterConfig)> = self
            .cluster_order
            .iter()
            .filter_map(|name| {
                self.clusters
                    .get_key_value(name)
                    .map(|(k, v)| (k.as_str(), v))
            })
            .collect();
        for (name, cluster) in &self.clusters {
            if !self.cluster_order.contains(name) {
                ordered.push((name.as_str(), cluster));
            }
        }
        ordered
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Errors make the configuration unusable; warnings describe values that
    /// were adjusted.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        // 1. Clusters
        if self.clusters.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::NoClusters,
                "no clusters configured: add a [clusters.<name>] table or set RELAY_CLUSTERS",
            ));
        }

        let mut owners: HashMap<String, String> = HashMap::new();
        for (name, cluster) in self.ordered_clusters() {
            if !is_http_url(&cluster.endpoint) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidEndpoint,
                    format!(
                        "clusters.{name}.endpoint: '{}' is not an http(s) URL",
                        cluster.endpoint
                    ),
                ));
            }

            let canonical = normalize_term(name);
            let entity = cluster.to_cluster(name);
            for term in entity.terms() {
                let key = term_key(term);
                match owners.get(&key) {
                    Some(owner) if *owner != canonical => {
                        issues.push(ConfigIssue::error(
                            ConfigIssueCode::DuplicateAlias,
                            format!("'{term}' is claimed by both '{owner}' and '{canonical}'"),
                        ));
                    }
                    Some(_) => {}
                    None => {
                        owners.insert(key, canonical.clone());
                    }
                }
            }
        }

        if let Some(default) = self.default_cluster.as_deref()
            && !self.clusters.is_empty()
            && !self
                .clusters
                .keys()
                .any(|name| normalize_term(name) == normalize_term(default))
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownDefaultCluster,
                format!("default_cluster: '{default}' is not a configured cluster"),
            ));
        }

        // 2. Ranges
        if !TIMEOUT_RANGE.contains(&self.timeout_seconds) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TimeoutOutOfRange,
                format!(
                    "timeout_seconds: {} must be between {} and {}",
                    self.timeout_seconds,
                    TIMEOUT_RANGE.start(),
                    TIMEOUT_RANGE.end()
                ),
            ));
        }
        if !TOKEN_LIMIT_RANGE.contains(&self.token_limit) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TokenLimitOutOfRange,
                format!(
                    "token_limit: {} must be between {} and {}",
                    self.token_limit,
                    TOKEN_LIMIT_RANGE.start(),
                    TOKEN_LIMIT_RANGE.end()
                ),
            ));
        }
        if self.max_parallel == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ZeroParallelism,
                "max_parallel: 0 is not usable, sub-queries will run one at a time",
            ));
        }

        // 3. Planner and access
        if let Some(url) = self.planner.url()
            && !is_http_url(url)
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidPlannerUrl,
                format!("planner.url: '{url}' is not an http(s) URL"),
            ));
        }
        if self.access.is_partial() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::IncompleteAccessCredentials,
                "access: both client_id and client_secret are required",
            ));
        }

        issues
    }

    /// Build the cluster registry (call after [`validate`](Self::validate)
    /// reported no errors).
    pub fn build_registry(&self) -> Result<ClusterRegistry, DomainError> {
        let clusters = self
            .ordered_clusters()
            .into_iter()
            .map(|(name, cluster)| cluster.to_cluster(name))
            .collect();
        let registry = ClusterRegistry::new(clusters)?;
        match self.default_cluster.as_deref() {
            Some(default) => registry.with_default(default),
            None => Ok(registry),
        }
    }

    pub fn relay_params(&self) -> RelayParams {
        RelayParams::default()
            .with_token_limit(self.token_limit)
            .with_exchange_timeout(Duration::from_secs(self.timeout_seconds))
            .with_max_parallel(self.max_parallel.max(1))
            .with_planner_timeout(Duration::from_secs(self.planner.timeout_seconds))
    }
}
