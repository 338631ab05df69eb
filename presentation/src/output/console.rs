//! Console output formatter for relay replies and operator reports

use colored::Colorize;
use relay_application::{AgentCard, ContextStatus, OrchestrateError, RelayReply, ReplyKind};
use relay_domain::{ClusterRegistry, ConfigIssue, Severity};

/// Formats replies, errors and reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a reply for the terminal.
    pub fn format_reply(reply: &RelayReply) -> String {
        let mut output = String::new();

        match &reply.kind {
            ReplyKind::Single { cluster } => {
                output.push_str(&format!("{}\n", format!("[{cluster}]").cyan().bold()));
                if reply.fallback {
                    output.push_str(&format!(
                        "{}\n",
                        "(could not split the request across clusters; answered by the default cluster)"
                            .yellow()
                    ));
                }
                if reply.text.trim().is_empty() {
                    output.push_str(&"(the agent finished without a text answer)".dimmed().to_string());
                } else {
                    output.push_str(&reply.text);
                }
            }
            ReplyKind::Multi { .. } => output.push_str(&reply.text),
        }

        output.push('\n');
        output
    }

    /// Format as JSON
    pub fn format_json(reply: &RelayReply) -> String {
        serde_json::to_string_pretty(reply).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format an error that ended a request.
    pub fn format_error(error: &OrchestrateError) -> String {
        match error.failure_kind() {
            Some(kind) => format!("{} {} ({})", "Error:".red().bold(), error, kind),
            None => format!("{} {}", "Error:".red().bold(), error),
        }
    }

    /// One line per active conversation of a thread.
    pub fn format_status(contexts: &[ContextStatus]) -> String {
        if contexts.is_empty() {
            return "No active conversations in this thread\n".to_string();
        }

        let now = chrono::Utc::now();
        let mut output = format!("{}\n", "Active conversations:".cyan().bold());
        for status in contexts {
            let snapshot = &status.snapshot;
            let usage = format!("{}%", status.budget_used_pct);
            let usage = if status.budget_used_pct >= 90 {
                usage.red().bold()
            } else if status.budget_used_pct >= 70 {
                usage.yellow()
            } else {
                usage.green()
            };
            output.push_str(&format!(
                "  {:<12} {} messages, ~{} tokens ({} of budget), last active {}\n",
                snapshot.cluster.bold(),
                snapshot.message_count,
                snapshot.token_estimate,
                usage,
                Self::ago(now - snapshot.last_activity)
            ));
        }
        output
    }

    /// Confirmation of a reset.
    pub fn format_reset(clusters: &[String]) -> String {
        if clusters.is_empty() {
            "Nothing to reset: no active conversation\n".to_string()
        } else {
            format!(
                "{} {}\n",
                "Conversation reset:".green(),
                clusters.join(", ")
            )
        }
    }

    /// Configured clusters with their aliases, default marked.
    pub fn format_clusters(registry: &ClusterRegistry) -> String {
        let default = registry.default_cluster().name();
        let mut output = format!("{}\n", "Clusters:".cyan().bold());
        for cluster in registry.iter() {
            let marker = if cluster.name() == default {
                " (default)".dimmed().to_string()
            } else {
                String::new()
            };
            output.push_str(&format!("  {}{}\n", cluster.name().bold(), marker));
            output.push_str(&format!("    endpoint: {}\n", cluster.endpoint()));
            if !cluster.aliases().is_empty() {
                output.push_str(&format!("    aliases:  {}\n", cluster.aliases().join(", ")));
            }
        }
        output
    }

    /// Agent card fetched by `discover`.
    pub fn format_agent_card(cluster: &str, card: &AgentCard) -> String {
        let mut output = format!(
            "{} {}",
            format!("[{cluster}]").cyan().bold(),
            card.name.bold()
        );
        if !card.version.is_empty() {
            output.push_str(&format!(" v{}", card.version));
        }
        output.push('\n');
        if !card.description.is_empty() {
            output.push_str(&format!("  {}\n", card.description));
        }
        for skill in &card.skills {
            let name = if skill.name.is_empty() { &skill.id } else { &skill.name };
            if skill.description.is_empty() {
                output.push_str(&format!("  - {}\n", name));
            } else {
                output.push_str(&format!("  - {}: {}\n", name, skill.description.dimmed()));
            }
        }
        output
    }

    /// Configuration issues, errors first.
    pub fn format_issues(issues: &[ConfigIssue]) -> String {
        let mut sorted: Vec<&ConfigIssue> = issues.iter().collect();
        sorted.sort_by_key(|issue| !issue.is_error());
        sorted
            .into_iter()
            .map(|issue| match issue.severity {
                Severity::Error => format!("{} {}", "error:".red().bold(), issue.message),
                Severity::Warning => format!("{} {}", "warning:".yellow().bold(), issue.message),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ago(elapsed: chrono::Duration) -> String {
        let secs = elapsed.num_seconds().max(0);
        match secs {
            0..=59 => "just now".to_string(),
            60..=3599 => format!("{}m ago", secs / 60),
            _ => format!("{}h ago", secs / 3600),
        }
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_application::{AgentSkill, ExchangeError};
    use relay_domain::{ClusterConfig, ConfigIssueCode, ContextSnapshot, FailureKind, SubResult};
    use std::time::Duration;

    fn status(cluster: &str, pct: u8) -> ContextStatus {
        ContextStatus {
            snapshot: ContextSnapshot {
                thread_id: "t1".to_string(),
                cluster: cluster.to_string(),
                protocol_context_id: Some("ctx".to_string()),
                message_count: 4,
                token_estimate: 1200,
                last_activity: chrono::Utc::now() - chrono::Duration::minutes(5),
            },
            budget_used_pct: pct,
        }
    }

    #[test]
    fn test_single_reply() {
        let reply = RelayReply {
            text: "42 pods".to_string(),
            kind: ReplyKind::Single {
                cluster: "prod".to_string(),
            },
            fallback: false,
        };
        let output = ConsoleFormatter::format_reply(&reply);
        assert!(output.contains("[prod]"));
        assert!(output.contains("42 pods"));
        assert!(!output.contains("default cluster"));
    }

    #[test]
    fn test_fallback_and_empty_reply() {
        let reply = RelayReply {
            text: String::new(),
            kind: ReplyKind::Single {
                cluster: "dev".to_string(),
            },
            fallback: true,
        };
        let output = ConsoleFormatter::format_reply(&reply);
        assert!(output.contains("answered by the default cluster"));
        assert!(output.contains("without a text answer"));
    }

    #[test]
    fn test_multi_reply_prints_synthesis() {
        let reply = RelayReply {
            text: "Results across 2 clusters:".to_string(),
            kind: ReplyKind::Multi {
                results: vec![SubResult::ok("dev", "a")],
            },
            fallback: false,
        };
        assert_eq!(
            ConsoleFormatter::format_reply(&reply),
            "Results across 2 clusters:\n"
        );
    }

    #[test]
    fn test_json_reply() {
        let reply = RelayReply {
            text: "ok".to_string(),
            kind: ReplyKind::Single {
                cluster: "dev".to_string(),
            },
            fallback: false,
        };
        let json: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&reply)).unwrap();
        assert_eq!(json["route"], "single");
        assert_eq!(json["cluster"], "dev");
    }

    #[test]
    fn test_error_includes_label() {
        let error = OrchestrateError::Exchange {
            cluster: "prod".to_string(),
            source: ExchangeError::TimedOut(Duration::from_secs(300)),
        };
        let output = ConsoleFormatter::format_error(&error);
        assert!(output.contains("prod: no answer within 300s"));
        assert!(output.contains(FailureKind::TimedOut.label()));
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(
            ConsoleFormatter::format_status(&[]),
            "No active conversations in this thread\n"
        );
        let output = ConsoleFormatter::format_status(&[status("dev", 3), status("prod", 95)]);
        assert!(output.contains("4 messages, ~1200 tokens"));
        assert!(output.contains("5m ago"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_reset_message() {
        assert!(ConsoleFormatter::format_reset(&[]).starts_with("Nothing to reset"));
        assert!(ConsoleFormatter::format_reset(&["dev".to_string()]).contains("dev"));
    }

    #[test]
    fn test_clusters_listing() {
        let registry = ClusterRegistry::new(vec![
            ClusterConfig::new("dev", "http://dev/", ["development"]),
            ClusterConfig::new("prod", "http://prod/", Vec::<String>::new()),
        ])
        .unwrap();
        let output = ConsoleFormatter::format_clusters(&registry);
        assert!(output.contains("(default)"));
        assert!(output.contains("aliases:  development"));
        assert!(output.contains("endpoint: http://prod/"));
    }

    #[test]
    fn test_agent_card() {
        let card = AgentCard {
            name: "k8s-agent".to_string(),
            description: "Kubernetes helper".to_string(),
            version: "1.0".to_string(),
            url: String::new(),
            skills: vec![AgentSkill {
                id: "pods".to_string(),
                name: String::new(),
                description: String::new(),
            }],
        };
        let output = ConsoleFormatter::format_agent_card("dev", &card);
        assert!(output.contains("v1.0"));
        assert!(output.contains("  - pods\n"));
    }

    #[test]
    fn test_issues_errors_first() {
        let issues = vec![
            ConfigIssue::warning(ConfigIssueCode::ZeroParallelism, "w"),
            ConfigIssue::error(ConfigIssueCode::NoClusters, "e"),
        ];
        let output = ConsoleFormatter::format_issues(&issues);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].ends_with(" e"));
        assert!(lines[1].ends_with(" w"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
