//! Terminal spinner for interactive runs

use crate::progress::{PipelineEvent, ProgressHandler};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::time::Duration;

const TEMPLATE_SPINNER: &str = "{spinner} {msg}";

/// Shows the current stage on a spinner and prints one line per finished stage.
///
/// Hidden when stderr is not a terminal or in quiet mode.
pub struct SpinnerHandler {
    bar: ProgressBar,
}

impl SpinnerHandler {
    pub fn new(quiet: bool) -> Self {
        if quiet || !std::io::stderr().is_terminal() {
            return Self::hidden();
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template(TEMPLATE_SPINNER) {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.bar.is_hidden()
    }

    /// Clear the spinner before printing final output
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressHandler for SpinnerHandler {
    fn on_progress(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, message } => {
                self.bar.set_message(format!("[{}] {}", stage, message));
            }
            PipelineEvent::Progress { stage, message } => {
                self.bar.set_message(format!("[{}] {}", stage, message));
            }
            PipelineEvent::StageCompleted {
                stage,
                message,
                duration,
            } => {
                self.bar.println(format!(
                    "\u{2713} [{}] {} ({:.1}s)",
                    stage,
                    message,
                    duration.as_secs_f64()
                ));
            }
            PipelineEvent::StageSkipped { stage, message } => {
                self.bar.println(format!("\u{21B7} [{}] {}", stage, message));
            }
            PipelineEvent::StageFailed { stage, message } => {
                self.bar.println(format!("\u{2717} [{}] {}", stage, message));
            }
        }
    }
}
