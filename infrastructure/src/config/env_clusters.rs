//! Cluster definitions from environment variables.
//!
//! Deployments that configure everything through the environment describe
//! clusters with a flat variable scheme instead of TOML tables:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `RELAY_CLUSTERS` | comma-separated cluster names, in registration order |
//! | `RELAY_<NAME>_URL` | full A2A endpoint of one cluster |
//! | `RELAY_AGENT_PATTERN` | agent name with a `{cluster}` placeholder |
//! | `RELAY_<NAME>_BASE_URL` / `RELAY_BASE_URL` | base URL for pattern endpoints |
//! | `RELAY_NAMESPACE` | agent namespace for pattern endpoints |
//! | `RELAY_<NAME>_ALIASES` | comma-separated aliases (built-in defaults otherwise) |
//! | `RELAY_A2A_URL` | single agent URL, registered as cluster `default` |
//!
//! Pattern endpoints are `<base>/api/a2a/<namespace>/<agent>/`.

use super::file_config::FileClusterConfig;
use thiserror::Error;
use tracing::info;

/// Name given to the cluster defined by `RELAY_A2A_URL`.
pub const SINGLE_CLUSTER_NAME: &str = "default";

/// Aliases applied when a well-known cluster name has none configured.
const DEFAULT_ALIASES: &[(&str, &[&str])] = &[
    ("prod", &["production", "prd"]),
    ("dev", &["development", "develop"]),
    ("test", &["testing", "tst"]),
    ("stage", &["staging", "stg"]),
    ("qa", &["quality", "qc"]),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvClusterError {
    #[error("RELAY_CLUSTERS is set but lists no cluster names")]
    EmptyClusterList,

    #[error(
        "no endpoint for cluster '{cluster}': set RELAY_{upper}_URL, or RELAY_AGENT_PATTERN with a base URL"
    )]
    MissingEndpoint { cluster: String, upper: String },

    #[error("pattern endpoints require RELAY_BASE_URL or RELAY_{upper}_BASE_URL")]
    MissingBaseUrl { upper: String },

    #[error("pattern endpoints require RELAY_NAMESPACE")]
    MissingNamespace,
}

/// Clusters read from the environment, in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvClusters {
    pub clusters: Vec<(String, FileClusterConfig)>,
}

impl EnvClusters {
    /// Read from the process environment.
    pub fn from_env() -> Result<Option<Self>, EnvClusterError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`; `None` when neither `RELAY_CLUSTERS` nor
    /// `RELAY_A2A_URL` is set.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, EnvClusterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(list) = var("RELAY_CLUSTERS") {
            let names: Vec<String> = split_list(&list)
                .into_iter()
                .map(|n| n.to_lowercase())
                .collect();
            if names.is_empty() {
                return Err(EnvClusterError::EmptyClusterList);
            }

            let pattern = var("RELAY_AGENT_PATTERN");
            let mut clusters = Vec::with_capacity(names.len());
            for name in names {
                let upper = name.to_uppercase().replace('-', "_");
                let endpoint = match (var(&format!("RELAY_{upper}_URL")), pattern.as_deref()) {
                    (Some(url), _) => url,
                    (None, Some(pattern)) => {
                        let base = var(&format!("RELAY_{upper}_BASE_URL"))
                            .or_else(|| var("RELAY_BASE_URL"))
                            .ok_or_else(|| EnvClusterError::MissingBaseUrl {
                                upper: upper.clone(),
                            })?;
                        let namespace =
                            var("RELAY_NAMESPACE").ok_or(EnvClusterError::MissingNamespace)?;
                        pattern_endpoint(&base, &namespace, &pattern.replace("{cluster}", &name))
                    }
                    (None, None) => {
                        return Err(EnvClusterError::MissingEndpoint {
                            cluster: name,
                            upper,
                        });
                    }
                };

                let aliases = match var(&format!("RELAY_{upper}_ALIASES")) {
                    Some(list) => split_list(&list),
                    None => default_aliases(&name),
                };
                info!("Cluster {} from environment: {}", name, endpoint);
                clusters.push((name, FileClusterConfig::new(endpoint, aliases)));
            }
            return Ok(Some(Self { clusters }));
        }

        if let Some(url) = var("RELAY_A2A_URL") {
            info!("Single cluster from RELAY_A2A_URL: {}", url);
            return Ok(Some(Self {
                clusters: vec![(
                    SINGLE_CLUSTER_NAME.to_string(),
                    FileClusterConfig::new(url, Vec::new()),
                )],
            }));
        }

        Ok(None)
    }

    pub fn names(&self) -> Vec<String> {
        self.clusters.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Built-in aliases for a well-known cluster name.
pub fn default_aliases(name: &str) -> Vec<String> {
    DEFAULT_ALIASES
        .iter()
        .find(|(cluster, _)| *cluster == name)
        .map(|(_, aliases)| aliases.iter().map(|a| a.to_string()).collect())
        .unwrap_or_default()
}

fn pattern_endpoint(base: &str, namespace: &str, agent: &str) -> String {
    format!(
        "{}/api/a2a/{}/{}/",
        base.trim_end_matches('/'),
        namespace.trim_matches('/'),
        agent.trim_matches('/')
    )
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
