//! Cluster detection from free text.
//!
//! Matching is whole-word and case-insensitive: the utterance is split into
//! word spans, and every window of consecutive spans (up to the longest
//! configured term) is probed against the registry's term index. A window's
//! key is its words joined by single spaces, so the separators between the
//! words of a multi-word alias do not matter. Because a window always starts
//! and ends on a word boundary, `dev` never matches inside `devops` and
//! `test` never matches inside `latest`, while hyphenated or multi-word
//! aliases (`test-cluster`, `quality control`) still match as a unit.

use super::entities::is_word_char;
use super::registry::ClusterRegistry;

/// One cluster mentioned in an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterMatch {
    /// Canonical cluster name
    pub cluster: String,
    /// The name or alias that matched, as a term key
    pub term: String,
    /// Character offset of the match in the utterance
    pub position: usize,
}

/// A word span in the lowercased utterance.
#[derive(Debug, Clone, Copy)]
struct Span {
    byte_start: usize,
    byte_end: usize,
    char_start: usize,
}

/// Maps utterances to configured clusters
#[derive(Debug, Clone, Copy)]
pub struct ClusterRouter<'a> {
    registry: &'a ClusterRegistry,
}

impl<'a> ClusterRouter<'a> {
    pub fn new(registry: &'a ClusterRegistry) -> Self {
        Self { registry }
    }

    /// Return the cluster the utterance targets, if any.
    ///
    /// When several clusters are mentioned, the one whose term appears
    /// earliest wins; equal positions fall back to registration order.
    /// Returns `None` for empty input or when nothing matches, in which case
    /// callers use the registry's default cluster.
    pub fn detect(&self, utterance: &str) -> Option<&'a str> {
        let ((_, cluster_pos), _) = self.scan(utterance).into_iter().min()?;
        Some(self.registry.cluster_at(cluster_pos).name())
    }

    /// Every distinct cluster mentioned, ordered by first appearance.
    pub fn detect_all(&self, utterance: &str) -> Vec<ClusterMatch> {
        let mut hits = self.scan(utterance);
        hits.sort();

        let mut seen: Vec<usize> = Vec::new();
        let mut matches = Vec::new();
        for ((char_pos, cluster_pos), term) in hits {
            if seen.contains(&cluster_pos) {
                continue;
            }
            seen.push(cluster_pos);
            matches.push(ClusterMatch {
                cluster: self.registry.cluster_at(cluster_pos).name().to_string(),
                term,
                position: char_pos,
            });
        }
        matches
    }

    /// Resolve the target cluster, falling back to the default.
    pub fn route(&self, utterance: &str) -> &'a str {
        self.detect(utterance)
            .unwrap_or_else(|| self.registry.default_cluster().name())
    }

    /// All term hits as `((char_position, cluster_position), term)`.
    fn scan(&self, utterance: &str) -> Vec<((usize, usize), String)> {
        if utterance.trim().is_empty() {
            return Vec::new();
        }

        let lowered = utterance.to_lowercase();
        let spans = word_spans(&lowered);
        let max_words = self.registry.max_term_words();

        let mut hits = Vec::new();
        for start in 0..spans.len() {
            let last = (start + max_words).min(spans.len());
            let mut key = String::new();
            for span in &spans[start..last] {
                if !key.is_empty() {
                    key.push(' ');
                }
                key.push_str(&lowered[span.byte_start..span.byte_end]);
                if let Some(cluster_pos) = self.registry.lookup_term(&key) {
                    hits.push(((spans[start].char_start, cluster_pos), key.clone()));
                }
            }
        }
        hits
    }
}

/// Split text into maximal runs of word characters.
fn word_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut current: Option<Span> = None;

    for (char_index, (byte_index, c)) in text.char_indices().enumerate() {
        if is_word_char(c) {
            let end = byte_index + c.len_utf8();
            match current.as_mut() {
                Some(span) => span.byte_end = end,
                None => {
                    current = Some(Span {
                        byte_start: byte_index,
                        byte_end: end,
                        char_start: char_index,
                    })
                }
            }
        } else if let Some(span) = current.take() {
            spans.push(span);
        }
    }
    if let Some(span) = current {
        spans.push(span);
    }
    spans
}
