//! Planner configuration from TOML (`[planner]` section)

use relay_application::config::relay_params::DEFAULT_PLANNER_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};

/// Raw planner configuration from TOML
///
/// Without a `url` the local mention planner is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlannerConfig {
    /// Planning service endpoint
    pub url: Option<String>,
    /// Deadline for one planning call
    pub timeout_seconds: u64,
    /// Answer from the default cluster when the plan is unusable
    pub fallback: bool,
}

impl Default for FilePlannerConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: DEFAULT_PLANNER_TIMEOUT_SECS,
            fallback: true,
        }
    }
}

impl FilePlannerConfig {
    /// Configured URL, if non-blank.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
