//! `[output]`: how `ask` prints answers

use relay_domain::OutputFormat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// `text` or `json`; unset means text
    pub format: Option<OutputFormat>,
    /// Colored cluster headers and failure labels
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// Format for one invocation; `--json` always wins over the file.
    pub fn effective_format(&self, json_flag: bool) -> OutputFormat {
        if json_flag {
            OutputFormat::Json
        } else {
            self.format.unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileConfig;

    #[test]
    fn test_json_from_file() {
        let config: FileConfig = toml::from_str("[output]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.output.effective_format(false), OutputFormat::Json);
        assert!(config.output.color);
    }

    #[test]
    fn test_flag_overrides_text_default() {
        let output = FileOutputConfig::default();
        assert_eq!(output.effective_format(false), OutputFormat::Text);
        assert_eq!(output.effective_format(true), OutputFormat::Json);
    }
}
