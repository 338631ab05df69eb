//! Single- vs multi-cluster request classification.
//!
//! A request is multi-cluster when it names two or more distinct clusters,
//! or when it contains a fan-out cue such as "all clusters". Comparison
//! verbs alone never make a request multi-cluster; they only mark a
//! multi-cluster request as a comparison.

use crate::cluster::registry::ClusterRegistry;
use serde::{Deserialize, Serialize};

/// Phrases that address every configured cluster.
const FAN_OUT_CUES: &[&str] = &[
    "all clusters",
    "every cluster",
    "each cluster",
    "across clusters",
    "across all",
];

/// Phrases that ask for a side-by-side answer.
const COMPARISON_CUES: &[&str] = &["compare", "versus", "vs", "diff", "difference between"];

/// How an inbound request is dispatched. Decided once, up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    /// One exchange against one cluster.
    Single {
        cluster: String,
        /// False when no cluster was mentioned and the default was used
        routed: bool,
    },
    /// Plan, map and reduce over the candidate clusters.
    Multi {
        candidates: Vec<String>,
        comparison: bool,
    },
}

impl RequestKind {
    pub fn is_multi(&self) -> bool {
        matches!(self, RequestKind::Multi { .. })
    }
}

/// Classify an utterance against the registry.
pub fn classify(utterance: &str, registry: &ClusterRegistry) -> RequestKind {
    let router = registry.router();
    let mentioned = router.detect_all(utterance);
    let phrase = cue_text(utterance);
    let comparison = contains_cue(&phrase, COMPARISON_CUES);

    if contains_cue(&phrase, FAN_OUT_CUES) {
        return RequestKind::Multi {
            candidates: registry.names(),
            comparison,
        };
    }

    match mentioned.as_slice() {
        [] => RequestKind::Single {
            cluster: registry.default_cluster().name().to_string(),
            routed: false,
        },
        [only] => RequestKind::Single {
            cluster: only.cluster.clone(),
            routed: true,
        },
        many => RequestKind::Multi {
            candidates: many.iter().map(|m| m.cluster.clone()).collect(),
            comparison,
        },
    }
}

/// Lowercase words separated by single spaces, padded at both ends so that
/// cue lookup is a whole-word `contains`.
fn cue_text(utterance: &str) -> String {
    let words: Vec<String> = utterance
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", words.join(" "))
}

fn contains_cue(phrase: &str, cues: &[&str]) -> bool {
    cues.iter().any(|cue| phrase.contains(&format!(" {cue} ")))
}
