//! Cluster configuration entity

use serde::{Deserialize, Serialize};

/// Configuration for one cluster (Value Object)
///
/// `name` is the canonical, lowercase key. `aliases` are used for detection
/// only and never shown to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    name: String,
    endpoint: String,
    aliases: Vec<String>,
}

impl ClusterConfig {
    /// Creates a cluster config, normalizing name and aliases.
    ///
    /// Aliases are lowercased and trimmed; empty entries, duplicates and
    /// aliases equal to the name are dropped.
    pub fn new<I, S>(name: impl AsRef<str>, endpoint: impl Into<String>, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = normalize_term(name.as_ref());
        let mut normalized: Vec<String> = Vec::new();
        for alias in aliases {
            let alias = normalize_term(alias.as_ref());
            if alias.is_empty() || alias == name || normalized.contains(&alias) {
                continue;
            }
            normalized.push(alias);
        }

        Self {
            name,
            endpoint: endpoint.into(),
            aliases: normalized,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Canonical name followed by every alias.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Lowercase a detection term and strip surrounding non-word characters.
///
/// A term that starts or ends with punctuation could never satisfy the
/// whole-word rule, so the punctuation is removed up front.
pub fn normalize_term(term: &str) -> String {
    term.trim()
        .to_lowercase()
        .trim_matches(|c: char| !is_word_char(c))
        .to_string()
}

/// Lookup key for a detection term: its lowercase words joined by single
/// spaces, so `quality control`, `Quality-Control` and `quality\ncontrol`
/// share one key.
pub fn term_key(term: &str) -> String {
    term.to_lowercase()
        .split(|c: char| !is_word_char(c))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Characters that belong to a word for boundary detection.
///
/// Underscore counts as part of a word so that `dev_ops` never matches `dev`.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_name_and_aliases() {
        let cluster = ClusterConfig::new(
            " Prod ",
            "http://prod:8083/api/a2a/kagent/k8s-agent/",
            ["Production", "PRD", "prod", "", "production"],
        );
        assert_eq!(cluster.name(), "prod");
        assert_eq!(cluster.aliases(), &["production", "prd"]);
    }

    #[test]
    fn test_terms_yield_name_first() {
        let cluster = ClusterConfig::new("dev", "http://dev", ["development"]);
        let terms: Vec<&str> = cluster.terms().collect();
        assert_eq!(terms, vec!["dev", "development"]);
    }

    #[test]
    fn test_normalize_term_strips_edge_punctuation() {
        assert_eq!(normalize_term("-Test-Cluster!"), "test-cluster");
        assert_eq!(normalize_term("  QA  "), "qa");
    }

    #[test]
    fn test_term_key_collapses_separators() {
        assert_eq!(term_key("Quality Control"), "quality control");
        assert_eq!(term_key("quality  -\ncontrol"), "quality control");
        assert_eq!(term_key("test-cluster"), "test cluster");
        assert_eq!(term_key("dev_ops"), "dev_ops");
    }
}
