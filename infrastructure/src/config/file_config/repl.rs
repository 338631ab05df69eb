//! `[repl]`: the interactive `chat` session

use super::logging::expand_home;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Spinner while clusters answer
    pub show_progress: bool,
    /// Line history; `~/` is expanded. Unset keeps the platform data dir.
    pub history_file: Option<String>,
    /// Conversation thread when `chat` runs without `--thread`
    pub thread: String,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            thread: "local".to_string(),
        }
    }
}

impl FileReplConfig {
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(expand_home)
    }

    /// Thread id for a session, preferring the command-line value.
    pub fn thread_for(&self, requested: Option<String>) -> String {
        requested
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.thread.clone())
    }
}
