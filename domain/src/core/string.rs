//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Render user-supplied text for a single log line.
///
/// Keeps at most 100 characters and flattens line breaks so a message
/// cannot forge additional log records.
pub fn log_safe(s: &str) -> String {
    const MAX_CHARS: usize = 100;

    let mut out: String = s
        .chars()
        .take(MAX_CHARS)
        .filter(|c| *c != '\r')
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect();
    if s.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // Each character is 3 bytes
        assert_eq!(truncate("日本語テスト", 30), "日本語テスト");
        assert_eq!(truncate("日本語テスト文字列", 15), "日本語テ...");
    }

    #[test]
    fn test_log_safe_flattens_newlines() {
        assert_eq!(log_safe("list pods\nin dev\r\n"), "list pods in dev ");
    }

    #[test]
    fn test_log_safe_caps_length() {
        let long = "x".repeat(150);
        let safe = log_safe(&long);
        assert_eq!(safe.len(), 103);
        assert!(safe.ends_with("..."));
    }
}
