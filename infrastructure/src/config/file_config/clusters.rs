//! Cluster configuration from TOML (`[clusters.<name>]` tables)

use relay_domain::ClusterConfig;
use serde::{Deserialize, Serialize};

/// Raw cluster entry from TOML
///
/// # Example
///
/// ```toml
/// [clusters.prod]
/// endpoint = "https://prod.example.com/api/a2a/kagent/k8s-agent/"
/// aliases = ["production", "prd"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileClusterConfig {
    /// A2A endpoint the exchange request is POSTed to
    pub endpoint: String,
    /// Alternative names used for detection
    pub aliases: Vec<String>,
}

impl FileClusterConfig {
    pub fn new(endpoint: impl Into<String>, aliases: Vec<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            aliases,
        }
    }

    /// Convert to the domain entity under the given name.
    pub fn to_cluster(&self, name: &str) -> ClusterConfig {
        ClusterConfig::new(name, self.endpoint.trim(), &self.aliases)
    }
}

/// True for endpoints the HTTP client can reach.
pub fn is_http_url(url: &str) -> bool {
    let url = url.trim();
    ["http://", "https://"].iter().any(|scheme| {
        url.len() > scheme.len()
            && url
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_deserialize() {
        let toml_str = r#"
[clusters.Prod]
endpoint = "https://prod.example.com/a2a/"
aliases = ["Production", "prd"]
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let cluster = config.clusters["Prod"].to_cluster("Prod");
        assert_eq!(cluster.name(), "prod");
        assert_eq!(cluster.endpoint(), "https://prod.example.com/a2a/");
        assert_eq!(cluster.aliases(), ["production", "prd"]);
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("http://dev:8083/api/a2a/ns/agent/"));
        assert!(is_http_url("HTTPS://prod.example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url(""));
    }
}
