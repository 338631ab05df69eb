//! REPL (Read-Eval-Print Loop) for interactive chat

use super::input::ReplInput;
use crate::{ConsoleFormatter, ProgressReporter};
use relay_application::{
    AgentGateway, ContextOutcome, ManageContextUseCase, OrchestrateInput, OrchestrateUseCase,
};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::sync::Arc;

/// Number of lines kept in the history file.
const HISTORY_CAPACITY: usize = 1000;

/// What the REPL prints for one line, and whether to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplResponse {
    pub output: String,
    pub quit: bool,
}

impl ReplResponse {
    fn print(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            quit: false,
        }
    }
}

/// Interactive chat REPL
pub struct ChatRepl<G: AgentGateway + 'static> {
    orchestrate: Arc<OrchestrateUseCase<G>>,
    manage: Arc<ManageContextUseCase>,
    thread_id: String,
    show_progress: bool,
    history_file: Option<PathBuf>,
}

impl<G: AgentGateway + 'static> ChatRepl<G> {
    pub fn new(
        orchestrate: Arc<OrchestrateUseCase<G>>,
        manage: Arc<ManageContextUseCase>,
        thread_id: impl Into<String>,
    ) -> Self {
        Self {
            orchestrate,
            manage,
            thread_id: thread_id.into(),
            show_progress: true,
            history_file: dirs::data_dir().map(|p| p.join("cluster-relay").join("history.txt")),
        }
    }

    /// Set whether to show progress
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Override the history file location
    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.history_file = path;
        }
        self
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_file else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(_) => editor,
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("relay:{}", self.thread_id)),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let response = self.respond(&line).await;
                    if !response.output.is_empty() {
                        println!("{}", response.output);
                    }
                    if response.quit {
                        break;
                    }
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                _ => continue,
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           cluster-relay - Chat Mode         │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Thread: {}", self.thread_id);
        println!(
            "Clusters: {} (default: {})",
            self.orchestrate.registry().names().join(", "),
            self.orchestrate.registry().default_cluster().name()
        );
        println!();
        println!("{}", Self::help());
    }

    fn help() -> String {
        [
            "Commands:",
            "  /help, /h, /?          - Show this help",
            "  /clusters              - List clusters and aliases",
            "  /status                - Show this thread's conversations",
            "  /reset [cluster]       - Forget one or all conversations",
            "  /quit, /exit, /q       - Exit chat",
            "",
            "Anything else is sent to the clusters it mentions.",
        ]
        .join("\n")
    }

    /// Handle one input line.
    pub async fn respond(&self, line: &str) -> ReplResponse {
        match ReplInput::parse(line) {
            ReplInput::Empty => ReplResponse::print(""),
            ReplInput::Quit => ReplResponse {
                output: "Bye!".to_string(),
                quit: true,
            },
            ReplInput::Help => ReplResponse::print(Self::help()),
            ReplInput::Clusters => {
                ReplResponse::print(ConsoleFormatter::format_clusters(self.orchestrate.registry()))
            }
            ReplInput::UnknownCommand(command) => ReplResponse::print(format!(
                "Unknown command: {}\nType /help for available commands",
                command
            )),
            ReplInput::Context(command) => {
                match self.manage.execute(&self.thread_id, &command) {
                    Ok(ContextOutcome::Reset { clusters }) => {
                        ReplResponse::print(ConsoleFormatter::format_reset(&clusters))
                    }
                    Ok(ContextOutcome::Status { contexts }) => {
                        ReplResponse::print(ConsoleFormatter::format_status(&contexts))
                    }
                    Err(e) => ReplResponse::print(format!("Error: {}", e)),
                }
            }
            ReplInput::Query(utterance) => ReplResponse::print(self.ask(utterance).await),
        }
    }

    async fn ask(&self, utterance: String) -> String {
        let input = OrchestrateInput::new(self.thread_id.clone(), utterance);

        let result = if self.show_progress {
            let progress = ProgressReporter::new();
            let result = self.orchestrate.execute_with_progress(input, &progress).await;
            progress.finish();
            result
        } else {
            self.orchestrate.execute(input).await
        };

        match result {
            Ok(reply) => ConsoleFormatter::format_reply(&reply),
            Err(e) => ConsoleFormatter::format_error(&e),
        }
    }
}
