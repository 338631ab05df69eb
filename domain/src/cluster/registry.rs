//! Cluster registry
//!
//! The registry is built once per configuration load and is immutable
//! afterwards. Building it also builds the term index used by
//! [`ClusterRouter`]: the [`term_key`] of every canonical name and alias maps
//! to the position of its cluster in registration order.

use super::entities::{ClusterConfig, term_key};
use super::router::ClusterRouter;
use crate::core::error::DomainError;
use std::collections::HashMap;

/// The set of configured clusters
#[derive(Debug, Clone)]
pub struct ClusterRegistry {
    clusters: Vec<ClusterConfig>,
    /// term key (name or alias) → index into `clusters`
    index: HashMap<String, usize>,
    /// Longest term, counted in words (for multi-word aliases)
    max_term_words: usize,
    default_cluster: usize,
}

impl ClusterRegistry {
    /// Build a registry from clusters in registration order.
    ///
    /// The first cluster becomes the default; use [`with_default`](Self::with_default)
    /// to pick another one.
    pub fn new(clusters: Vec<ClusterConfig>) -> Result<Self, DomainError> {
        if clusters.is_empty() {
            return Err(DomainError::EmptyRegistry);
        }

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut max_term_words = 1;

        for (position, cluster) in clusters.iter().enumerate() {
            if clusters[..position].iter().any(|c| c.name() == cluster.name()) {
                return Err(DomainError::DuplicateCluster(cluster.name().to_string()));
            }

            for term in cluster.terms() {
                let key = term_key(term);
                if let Some(&owner) = index.get(&key)
                    && owner != position
                {
                    return Err(DomainError::DuplicateAlias {
                        alias: term.to_string(),
                        first: clusters[owner].name().to_string(),
                        second: cluster.name().to_string(),
                    });
                }
                max_term_words = max_term_words.max(key.split(' ').count());
                index.insert(key, position);
            }
        }

        Ok(Self {
            clusters,
            index,
            max_term_words,
            default_cluster: 0,
        })
    }

    /// Select the cluster used when routing finds no match.
    pub fn with_default(mut self, name: &str) -> Result<Self, DomainError> {
        let name = name.trim().to_lowercase();
        self.default_cluster = self
            .clusters
            .iter()
            .position(|c| c.name() == name)
            .ok_or(DomainError::UnknownCluster(name))?;
        Ok(self)
    }

    pub fn default_cluster(&self) -> &ClusterConfig {
        &self.clusters[self.default_cluster]
    }

    /// Look up a cluster by canonical name (case-insensitive).
    pub fn get(&self, name: &str) -> Option<&ClusterConfig> {
        let name = name.trim().to_lowercase();
        self.clusters.iter().find(|c| c.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolve a canonical name or alias to its cluster.
    pub fn resolve(&self, term: &str) -> Option<&ClusterConfig> {
        self.index.get(&term_key(term)).map(|&i| &self.clusters[i])
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.clusters.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClusterConfig> {
        self.clusters.iter()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Router over this registry's term index.
    pub fn router(&self) -> ClusterRouter<'_> {
        ClusterRouter::new(self)
    }

    // ==================== Index access (router) ====================

    /// `key` must already be a [`term_key`].
    pub(crate) fn lookup_term(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub(crate) fn max_term_words(&self) -> usize {
        self.max_term_words
    }

    pub(crate) fn cluster_at(&self, position: usize) -> &ClusterConfig {
        &self.clusters[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(name: &str, aliases: &[&str]) -> ClusterConfig {
        ClusterConfig::new(name, format!("http://{name}.example.com/"), aliases.iter())
    }

    #[test]
    fn test_empty_registry_rejected() {
        assert_eq!(
            ClusterRegistry::new(vec![]).unwrap_err(),
            DomainError::EmptyRegistry
        );
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ClusterRegistry::new(vec![cluster("dev", &[]), cluster("DEV", &[])]).unwrap_err();
        assert_eq!(err, DomainError::DuplicateCluster("dev".to_string()));
    }

    #[test]
    fn test_alias_shared_across_clusters_rejected() {
        let err = ClusterRegistry::new(vec![
            cluster("stage", &["stg"]),
            cluster("staging", &["stg"]),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateAlias { ref alias, .. } if alias == "stg"));
    }

    #[test]
    fn test_alias_colliding_with_other_name_rejected() {
        let err = ClusterRegistry::new(vec![cluster("stage", &[]), cluster("staging", &["stage"])])
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateAlias { .. }));
    }

    #[test]
    fn test_default_cluster_selection() {
        let registry = ClusterRegistry::new(vec![cluster("dev", &[]), cluster("prod", &[])]).unwrap();
        assert_eq!(registry.default_cluster().name(), "dev");

        let registry = registry.with_default("Prod").unwrap();
        assert_eq!(registry.default_cluster().name(), "prod");

        let err = registry.with_default("qa").unwrap_err();
        assert_eq!(err, DomainError::UnknownCluster("qa".to_string()));
    }

    #[test]
    fn test_resolve_by_alias() {
        let registry =
            ClusterRegistry::new(vec![cluster("prod", &["production", "prd"])]).unwrap();
        assert_eq!(registry.resolve("PRD").map(|c| c.name()), Some("prod"));
        assert_eq!(registry.resolve("prod").map(|c| c.name()), Some("prod"));
        assert!(registry.resolve("qa").is_none());
    }

    #[test]
    fn test_resolve_ignores_separators_in_aliases() {
        let registry = ClusterRegistry::new(vec![
            cluster("qa", &["quality control"]),
            cluster("test", &["test-cluster"]),
        ])
        .unwrap();
        assert_eq!(registry.resolve("Quality-Control").unwrap().name(), "qa");
        assert_eq!(registry.resolve("test cluster").unwrap().name(), "test");
        assert_eq!(registry.max_term_words(), 2);
    }

    #[test]
    fn test_aliases_differing_only_in_separators_collide() {
        let err = ClusterRegistry::new(vec![
            cluster("qa", &["quality control"]),
            cluster("qc", &["quality-control"]),
        ])
        .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateAlias { .. }));
    }
}
