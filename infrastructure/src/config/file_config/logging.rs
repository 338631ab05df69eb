//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of exchanges; `~` expands to the home directory
    pub transcript: Option<String>,
}

impl FileLoggingConfig {
    pub fn transcript_path(&self) -> Option<PathBuf> {
        self.transcript
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(expand_home)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_path() {
        let config = FileLoggingConfig {
            transcript: Some("/var/log/relay.jsonl".to_string()),
        };
        assert_eq!(
            config.transcript_path(),
            Some(PathBuf::from("/var/log/relay.jsonl"))
        );
        assert_eq!(FileLoggingConfig::default().transcript_path(), None);
    }

    #[test]
    fn test_expand_home() {
        let expanded = expand_home("~/relay/transcript.jsonl");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expanded, home.join("relay/transcript.jsonl"));
        }
        assert_eq!(expand_home("relative.jsonl"), PathBuf::from("relative.jsonl"));
    }
}
