//! Progress reporting while clusters are answering

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use relay_application::ports::progress::ProgressNotifier;
use relay_domain::{Plan, RequestKind, SubResult};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner that follows one request from routing to reduce
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = guard.as_ref() {
            f(spinner);
        }
    }

    /// Stop the spinner and clear its line.
    pub fn finish(&self) {
        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = guard.take() {
            spinner.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_route(&self, kind: &RequestKind) {
        let prefix = match kind {
            RequestKind::Single { cluster, .. } => cluster.clone(),
            RequestKind::Multi { candidates, .. } => format!("{} clusters", candidates.len()),
        };

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix(prefix);
        spinner.set_message(if kind.is_multi() {
            "Planning..."
        } else {
            "Waiting for the agent..."
        });
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = guard.replace(spinner) {
            previous.finish_and_clear();
        }
    }

    fn on_plan(&self, plan: &Plan) {
        let clusters = plan.clusters().join(", ");
        self.with_spinner(|s| s.set_message(format!("Asking {clusters}...")));
    }

    fn on_plan_rejected(&self, reason: &str) {
        self.with_spinner(|s| {
            s.println(format!("{} {}", "!".yellow(), reason));
            s.set_message("Falling back to the default cluster...");
        });
    }

    fn on_dispatch(&self, _cluster: &str) {}

    fn on_sub_result(&self, result: &SubResult) {
        let line = match result.failure_kind() {
            None => format!("{} {}", "v".green(), result.cluster),
            Some(kind) => format!("{} {} ({})", "x".red(), result.cluster, kind),
        };
        self.with_spinner(|s| s.println(line));
    }

    fn on_reduce(&self, _succeeded: usize, _failed: usize) {
        self.finish();
    }
}

/// Line-per-event progress on stderr, for use alongside log output
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_route(&self, kind: &RequestKind) {
        match kind {
            RequestKind::Single { cluster, routed } => {
                let how = if *routed { "" } else { " (default)" };
                eprintln!("{} {}{}", "->".cyan(), cluster.bold(), how);
            }
            RequestKind::Multi { candidates, .. } => {
                eprintln!("{} {}", "->".cyan(), candidates.join(", ").bold());
            }
        }
    }

    fn on_plan_rejected(&self, reason: &str) {
        eprintln!("  {} {}", "!".yellow(), reason);
    }

    fn on_dispatch(&self, _cluster: &str) {}

    fn on_sub_result(&self, result: &SubResult) {
        match result.failure_kind() {
            None => eprintln!("  {} {}", "v".green(), result.cluster),
            Some(kind) => eprintln!("  {} {} ({})", "x".red(), result.cluster, kind),
        }
    }
}
