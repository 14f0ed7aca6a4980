//! Logging-based progress handler

use super::{PipelineEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StageStarted { stage, message } => {
                info!(stage = %stage, "Starting stage: {}", message);
            }
            PipelineEvent::StageCompleted {
                stage,
                message,
                duration,
            } => {
                info!(
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete: {}",
                    message
                );
            }
            PipelineEvent::StageSkipped { stage, message } => {
                info!(stage = %stage, "Skipping stage: {}", message);
            }
            PipelineEvent::StageFailed { stage, message } => {
                warn!(stage = %stage, error = %message, "Stage failed");
            }
            PipelineEvent::Progress { stage, message } => {
                debug!(stage = %stage, "{}", message);
            }
        }
    }
}
