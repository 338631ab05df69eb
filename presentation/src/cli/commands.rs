//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for cluster-relay
#[derive(Parser, Debug)]
#[command(name = "cluster-relay")]
#[command(author, version, about = "Route questions to per-cluster A2A agents")]
#[command(long_about = r#"
cluster-relay forwards questions to the agent running in each Kubernetes
cluster and keeps one conversation per thread and cluster.

A question that names one cluster (or an alias such as "production") goes to
that cluster; one that names no cluster goes to the default cluster. A
question that names several clusters, or asks about "all clusters", is split
by the planner, sent to every cluster concurrently, and answered with one
combined reply that lists any cluster that failed.

Configuration files are loaded from (in priority order):
1. RELAY_* environment variables
2. --config <path>     Explicit config file
3. ./relay.toml        Project-level config
4. ~/.config/cluster-relay/config.toml   Global config

Example:
  cluster-relay ask "how many pods are running in prod?"
  cluster-relay ask --thread ops-42 "compare node usage between dev and prod"
  cluster-relay chat
  cluster-relay discover prod
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, value_name = "DIR", global = true)]
    pub log_file: Option<PathBuf>,

    /// Print the reply as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ask one question and print the answer
    Ask {
        /// Conversation thread; reuse it to continue a conversation
        #[arg(short, long, value_name = "ID")]
        thread: Option<String>,

        /// The question (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        utterance: Vec<String>,
    },

    /// Start an interactive chat
    Chat {
        /// Conversation thread for the whole session
        #[arg(short, long, value_name = "ID")]
        thread: Option<String>,
    },

    /// Fetch the agent card of one or every configured cluster
    Discover {
        /// Cluster name or alias
        cluster: Option<String>,
    },

    /// Show configuration sources and the resolved clusters
    ShowConfig,
}

impl Command {
    /// The question of an `ask` command.
    pub fn utterance(&self) -> Option<String> {
        match self {
            Command::Ask { utterance, .. } => Some(utterance.join(" ")),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::parse_from([
            "cluster-relay",
            "-vv",
            "ask",
            "--thread",
            "t1",
            "pods",
            "in",
            "prod",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.utterance().as_deref(), Some("pods in prod"));
        assert!(matches!(cli.command, Command::Ask { thread: Some(ref t), .. } if t == "t1"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cluster-relay", "chat", "--no-config", "--json"]);
        assert!(cli.no_config);
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Chat { thread: None }));
    }

    #[test]
    fn test_ask_requires_utterance() {
        assert!(Cli::try_parse_from(["cluster-relay", "ask"]).is_err());
    }

    #[test]
    fn test_discover_and_show_config() {
        let cli = Cli::parse_from(["cluster-relay", "discover", "prod"]);
        assert!(matches!(cli.command, Command::Discover { cluster: Some(ref c) } if c == "prod"));
        let cli = Cli::parse_from(["cluster-relay", "show-config"]);
        assert!(matches!(cli.command, Command::ShowConfig));
    }
}
