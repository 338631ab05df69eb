//! Reduce step: merge per-cluster sub-results into one answer.

use super::value_objects::{FailureKind, SubResult};

/// Synthesize the reduced answer.
///
/// Each successful fragment is attributed to its cluster, each failure is
/// flagged in place and listed again in a closing `Unavailable:` line.
/// Returns `None` if no sub-result succeeded; callers turn that into an
/// aggregate error via [`failures`].
pub fn synthesize(results: &[SubResult], comparison: bool) -> Option<String> {
    if !results.iter().any(SubResult::is_ok) {
        return None;
    }

    let plural = if results.len() == 1 { "" } else { "s" };
    let mut out = format!("Results across {} cluster{plural}", results.len());
    if comparison {
        out.push_str(" (comparison)");
    }
    out.push(':');

    for result in results {
        out.push_str("\n\n");
        match (result.text.as_deref(), result.failure_kind()) {
            (Some(text), None) => {
                let text = text.trim();
                out.push_str(&format!("[{}]\n", result.cluster));
                out.push_str(if text.is_empty() {
                    "(no text returned)"
                } else {
                    text
                });
            }
            (_, kind) => {
                let kind = kind.unwrap_or(FailureKind::Unknown);
                out.push_str(&format!("[{}] {}", result.cluster, kind.describe()));
            }
        }
    }

    let failed = failures(results);
    if !failed.is_empty() {
        let listed: Vec<String> = failed
            .iter()
            .map(|(cluster, kind)| format!("{cluster} ({kind})"))
            .collect();
        out.push_str("\n\nUnavailable: ");
        out.push_str(&listed.join(", "));
    }

    Some(out)
}

/// Every failed sub-result as `(cluster, kind)`, in plan order.
pub fn failures(results: &[SubResult]) -> Vec<(String, FailureKind)> {
    results
        .iter()
        .filter_map(|r| r.failure_kind().map(|kind| (r.cluster.clone(), kind)))
        .collect()
}
