//! Classification of one REPL line

use relay_domain::ContextCommand;

/// What a line typed into the chat asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Quit,
    Help,
    Clusters,
    /// `/reset`, `/status` and their plain-text forms (`reset prod`)
    Context(ContextCommand),
    /// Anything else is a question for the clusters
    Query(String),
    UnknownCommand(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }

        if let Some(command) = line.strip_prefix('/') {
            return match command.to_lowercase().as_str() {
                "quit" | "exit" | "q" => Self::Quit,
                "help" | "h" | "?" => Self::Help,
                "clusters" => Self::Clusters,
                _ => ContextCommand::parse(line)
                    .map(Self::Context)
                    .unwrap_or_else(|| Self::UnknownCommand(line.to_string())),
            };
        }

        match ContextCommand::parse(line) {
            Some(command) => Self::Context(command),
            None => Self::Query(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_commands() {
        assert_eq!(ReplInput::parse("/quit"), ReplInput::Quit);
        assert_eq!(ReplInput::parse(" /Q "), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/help"), ReplInput::Help);
        assert_eq!(ReplInput::parse("/clusters"), ReplInput::Clusters);
        assert_eq!(
            ReplInput::parse("/status"),
            ReplInput::Context(ContextCommand::Status)
        );
        assert_eq!(
            ReplInput::parse("/reset prod"),
            ReplInput::Context(ContextCommand::Reset {
                cluster: Some("prod".to_string())
            })
        );
        assert_eq!(
            ReplInput::parse("/frobnicate"),
            ReplInput::UnknownCommand("/frobnicate".to_string())
        );
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(
            ReplInput::parse("reset context"),
            ReplInput::Context(ContextCommand::Reset { cluster: None })
        );
        assert_eq!(
            ReplInput::parse("how many pods in prod?"),
            ReplInput::Query("how many pods in prod?".to_string())
        );
    }
}
