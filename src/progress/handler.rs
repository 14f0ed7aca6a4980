//! Progress handler trait and events

use crate::state::StageId;
use std::sync::Mutex;
use std::time::Duration;

/// Events emitted while the pipeline runs
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted { stage: StageId, message: String },

    StageCompleted {
        stage: StageId,
        message: String,
        duration: Duration,
    },

    /// Already done in a previous run
    StageSkipped { stage: StageId, message: String },

    StageFailed { stage: StageId, message: String },

    /// Intermediate update inside a stage, e.g. "Routes: 42 found"
    Progress { stage: StageId, message: String },
}

impl PipelineEvent {
    pub fn stage(&self) -> StageId {
        match self {
            PipelineEvent::StageStarted { stage, .. }
            | PipelineEvent::StageCompleted { stage, .. }
            | PipelineEvent::StageSkipped { stage, .. }
            | PipelineEvent::StageFailed { stage, .. }
            | PipelineEvent::Progress { stage, .. } => *stage,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            PipelineEvent::StageStarted { message, .. }
            | PipelineEvent::StageCompleted { message, .. }
            | PipelineEvent::StageSkipped { message, .. }
            | PipelineEvent::StageFailed { message, .. }
            | PipelineEvent::Progress { message, .. } => message,
        }
    }
}

/// Receives pipeline events. Implementations must return quickly; the pipeline
/// waits for each call.
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &PipelineEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &PipelineEvent) {}
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectingHandler {
    events: Mutex<Vec<PipelineEvent>>,
}

impl CollectingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl ProgressHandler for CollectingHandler {
    fn on_progress(&self, event: &PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
