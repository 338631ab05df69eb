//! Operator commands typed into a chat thread.
//!
//! ```
//! use relay_domain::ContextCommand;
//!
//! assert_eq!(
//!     ContextCommand::parse("reset context dev"),
//!     Some(ContextCommand::Reset { cluster: Some("dev".to_string()) })
//! );
//! assert_eq!(ContextCommand::parse("how many pods?"), None);
//! ```

/// A command that manages conversation state instead of querying a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextCommand {
    /// Forget one cluster's conversation (`Some`) or every conversation of
    /// the thread (`None`).
    Reset { cluster: Option<String> },
    /// Report message counts and token estimates for the thread.
    Status,
}

/// Words ignored after `reset`/`clear` (`reset the dev context`).
const FILLER_WORDS: &[&str] = &["context", "contexts", "conversation", "the", "cluster", "all"];

impl ContextCommand {
    /// Parse a command; returns `None` for ordinary queries.
    ///
    /// A leading `/` is accepted so REPL-style `/reset dev` works too. The
    /// cluster term is returned as typed (lowercased); resolving aliases is
    /// up to the caller.
    pub fn parse(text: &str) -> Option<Self> {
        let lowered = text.trim().trim_start_matches('/').to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        match words.as_slice() {
            ["status"] | ["context", "status"] | ["context"] => Some(Self::Status),
            [verb, rest @ ..] if *verb == "reset" || *verb == "clear" => {
                let target: Vec<&str> = rest
                    .iter()
                    .copied()
                    .filter(|w| !FILLER_WORDS.contains(w))
                    .collect();
                match target.as_slice() {
                    [] => Some(Self::Reset { cluster: None }),
                    [cluster] => Some(Self::Reset {
                        cluster: Some((*cluster).to_string()),
                    }),
                    // "reset pods in dev" reads like a query, not a command
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_all() {
        for text in ["reset", "reset context", "Clear", "/reset", "reset all contexts"] {
            assert_eq!(
                ContextCommand::parse(text),
                Some(ContextCommand::Reset { cluster: None }),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_reset_one_cluster() {
        for text in ["reset dev", "reset context dev", "reset the dev context", "/clear DEV"] {
            assert_eq!(
                ContextCommand::parse(text),
                Some(ContextCommand::Reset {
                    cluster: Some("dev".to_string())
                }),
                "text: {text}"
            );
        }
    }

    #[test]
    fn test_status() {
        assert_eq!(ContextCommand::parse("status"), Some(ContextCommand::Status));
        assert_eq!(ContextCommand::parse(" Context Status "), Some(ContextCommand::Status));
        assert_eq!(ContextCommand::parse("/status"), Some(ContextCommand::Status));
    }

    #[test]
    fn test_queries_are_not_commands() {
        for text in [
            "how many pods in dev",
            "reset the deployment nginx in dev",
            "status of prod nodes",
            "",
        ] {
            assert_eq!(ContextCommand::parse(text), None, "text: {text}");
        }
    }
}
