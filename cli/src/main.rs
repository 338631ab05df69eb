//! CLI entrypoint for cluster-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use relay_application::{
    AgentGateway, ContextStore, ConversationLogger, ManageContextUseCase, NoConversationLogger,
    OrchestrateInput, OrchestrateUseCase, PlanningOracle,
};
use relay_domain::{ClusterRegistry, OutputFormat, has_errors};
use relay_infrastructure::{
    A2aAgentGateway, ConfigLoader, FileConfig, HttpPlanningOracle, JsonlConversationLogger,
    MentionPlanner,
};
use relay_presentation::{
    ChatRepl, Cli, Command, ConsoleFormatter, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Thread id used by `ask` when none is given.
const ASK_THREAD: &str = "cli";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting cluster-relay");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()?
    } else {
        ConfigLoader::load(cli.config.as_ref())?
    };

    if !config.output.color {
        colored::control::set_override(false);
    }

    if matches!(cli.command, Command::ShowConfig) {
        show_config(&cli, &config);
        return Ok(ExitCode::SUCCESS);
    }

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("{}", issue.message);
    }
    if has_errors(&issues) {
        eprintln!("{}", ConsoleFormatter::format_issues(&issues));
        bail!("invalid configuration (run `cluster-relay show-config` for details)");
    }

    // === Dependency Injection ===
    let registry = Arc::new(config.build_registry()?);
    let params = config.relay_params();
    let access = config.access.credentials();

    let gateway = Arc::new(A2aAgentGateway::new()?.with_access(access.clone()));

    let planner: Arc<dyn PlanningOracle> = match config.planner.url() {
        Some(url) => {
            info!("Using planning service at {}", url);
            Arc::new(HttpPlanningOracle::new(url, params.planner_timeout).with_access(access))
        }
        None => Arc::new(MentionPlanner),
    };

    let logger: Arc<dyn ConversationLogger> = match config
        .logging
        .transcript_path()
        .and_then(JsonlConversationLogger::new)
    {
        Some(transcript) => {
            info!("Writing transcript to {}", transcript.path().display());
            Arc::new(transcript)
        }
        None => Arc::new(NoConversationLogger),
    };

    let store = Arc::new(ContextStore::new());
    let orchestrate = Arc::new(
        OrchestrateUseCase::new(
            Arc::clone(&gateway),
            planner,
            Arc::clone(&registry),
            Arc::clone(&store),
        )
        .with_params(params.clone())
        .with_logger(Arc::clone(&logger))
        .with_plan_fallback(config.planner.fallback),
    );
    let manage = Arc::new(
        ManageContextUseCase::new(Arc::clone(&store), Arc::clone(&registry), params.token_limit)
            .with_logger(logger),
    );

    let code = match cli.command {
        Command::Ask { ref thread, .. } => {
            let utterance = cli.command.utterance().unwrap_or_default();
            let input = OrchestrateInput::new(thread.as_deref().unwrap_or(ASK_THREAD), utterance);
            let json = config.output.effective_format(cli.json) == OutputFormat::Json;

            let result = if cli.quiet || json {
                orchestrate.execute(input).await
            } else if cli.verbose > 0 {
                // Spinner redraws would interleave with log lines
                orchestrate.execute_with_progress(input, &SimpleProgress).await
            } else {
                let progress = ProgressReporter::new();
                let result = orchestrate.execute_with_progress(input, &progress).await;
                progress.finish();
                result
            };

            match result {
                Ok(reply) if json => {
                    println!("{}", ConsoleFormatter::format_json(&reply));
                    ExitCode::SUCCESS
                }
                Ok(reply) => {
                    print!("{}", ConsoleFormatter::format_reply(&reply));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{}", ConsoleFormatter::format_error(&e));
                    ExitCode::FAILURE
                }
            }
        }
        Command::Chat { thread } => {
            ChatRepl::new(orchestrate, manage, config.repl.thread_for(thread))
                .with_progress(!cli.quiet && config.repl.show_progress)
                .with_history_file(config.repl.history_path())
                .run()
                .await
                .context("chat session failed")?;
            ExitCode::SUCCESS
        }
        Command::Discover { cluster } => {
            discover(gateway.as_ref(), &registry, cluster.as_deref()).await?
        }
        Command::ShowConfig => ExitCode::SUCCESS,
    };

    store.shutdown();
    Ok(code)
}

/// Initialize logging based on verbosity level; `RUST_LOG` takes precedence.
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "cluster-relay.log"));
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;
    Ok(Some(guard))
}

async fn discover<G: AgentGateway>(
    gateway: &G,
    registry: &ClusterRegistry,
    term: Option<&str>,
) -> Result<ExitCode> {
    let clusters = match term {
        Some(term) => match registry.resolve(term) {
            Some(cluster) => vec![cluster],
            None => bail!(
                "unknown cluster '{}' (known: {})",
                term,
                registry.names().join(", ")
            ),
        },
        None => registry.iter().collect(),
    };

    let mut failed = false;
    for cluster in clusters {
        match gateway.discover(cluster.endpoint()).await {
            Ok(card) => print!(
                "{}",
                ConsoleFormatter::format_agent_card(cluster.name(), &card)
            ),
            Err(e) => {
                failed = true;
                eprintln!("[{}] discovery failed: {} ({})", cluster.name(), e, e.kind());
            }
        }
    }
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn show_config(cli: &Cli, config: &FileConfig) {
    ConfigLoader::print_config_sources(cli.config.as_ref());
    println!();

    let issues = config.validate();
    if !issues.is_empty() {
        println!("{}", ConsoleFormatter::format_issues(&issues));
        println!();
    }

    match config.build_registry() {
        Ok(registry) => print!("{}", ConsoleFormatter::format_clusters(&registry)),
        Err(e) => println!("Clusters: {}", e),
    }

    let params = config.relay_params();
    println!();
    println!("token_limit:     {}", params.token_limit);
    println!("timeout:         {}s", params.exchange_timeout.as_secs());
    println!("max_parallel:    {}", params.max_parallel);
    match config.planner.url() {
        Some(url) => println!(
            "planner:         {} ({}s)",
            url,
            params.planner_timeout.as_secs()
        ),
        None => println!("planner:         local (one sub-query per mentioned cluster)"),
    }
    match config.logging.transcript_path() {
        Some(path) => println!("transcript:      {}", path.display()),
        None => println!("transcript:      off"),
    }
}
