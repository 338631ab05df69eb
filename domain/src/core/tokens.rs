//! Token estimation for conversation budgets.
//!
//! The remote agents do not report token usage, so budgets are enforced
//! against a local estimate. The heuristic is one token per four Unicode
//! scalar values, rounded up:
//!
//! - deterministic and allocation-free, O(n) in the input length
//! - monotonic: appending text never lowers the estimate
//! - multi-byte text (CJK, emoji) counts per character, not per byte, so it
//!   is never under-counted by more than the constant factor
//!
//! ```
//! use relay_domain::core::tokens::estimate_tokens;
//!
//! assert_eq!(estimate_tokens(""), 0);
//! assert_eq!(estimate_tokens("test"), 1);
//! assert_eq!(estimate_tokens("hello world"), 3);
//! ```

/// Characters counted as one token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the number of tokens in `text`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Estimate the tokens consumed by one conversational turn.
///
/// Both the outgoing query and the agent's answer stay in the remote
/// conversation, so both count against the budget.
pub fn estimate_exchange(query: &str, answer: &str) -> usize {
    estimate_tokens(query) + estimate_tokens(answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_basic_estimates() {
        assert_eq!(estimate_tokens("test"), 1);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens(&"a".repeat(100)), 25);
        assert_eq!(
            estimate_tokens("The quick brown fox jumps over the lazy dog"),
            11
        );
    }

    #[test]
    fn test_multiline_counts_newlines() {
        let text = "Line 1\nLine 2\nLine 3";
        assert_eq!(estimate_tokens(text), 5);
    }

    #[test]
    fn test_multibyte_counts_characters() {
        // 10 characters, far more bytes
        let text = "Hello 世界 🌍";
        assert_eq!(text.chars().count(), 10);
        assert_eq!(estimate_tokens(text), 3);
        assert!(estimate_tokens("日本語") >= 1);
    }

    #[test]
    fn test_monotonic_under_concatenation() {
        let pieces = ["", "a", "bc", "日本", "\n", "🌍🌍🌍", "pods are running"];
        let mut text = String::new();
        let mut previous = estimate_tokens(&text);
        for piece in pieces.iter().cycle().take(40) {
            text.push_str(piece);
            let current = estimate_tokens(&text);
            assert!(current >= previous, "estimate decreased at {:?}", text);
            previous = current;
        }
    }

    #[test]
    fn test_exchange_sums_both_sides() {
        assert_eq!(estimate_exchange("list pods", "42 pods"), 3 + 2);
        assert_eq!(estimate_exchange("", ""), 0);
    }
}
