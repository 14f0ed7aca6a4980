//! Per-run context shared by the stage phases

use super::artifacts::{self, ArtifactStore, Lazy};
use super::config::RunConfig;
use crate::analyzers::AnalyzerRegistry;
use crate::coverage::{CoverageEvaluation, CoverageEvaluator};
use crate::docs::{DocumentWriter, WrittenDocument};
use crate::enrich::Enricher;
use crate::gaps::{GapAnalyzer, GapReport};
use crate::inventory::{Inventory, InventoryScanner};
use crate::progress::{PipelineEvent, ProgressHandler};
use crate::source::{CloneOutcome, Cloner};
use crate::stack::{DetectorRegistry, StackProfile};
use crate::state::{StageId, StateManager};
use crate::surface::Surface;
use crate::trace::TraceabilityReport;
use std::time::Duration;

/// Collaborators a run calls out to
pub struct Services {
    pub cloner: Box<dyn Cloner>,
    pub scanner: Box<dyn InventoryScanner>,
    pub detectors: DetectorRegistry,
    pub analyzers: AnalyzerRegistry,
    pub enricher: Option<Box<dyn Enricher>>,
    pub writer: Box<dyn DocumentWriter>,
    pub coverage: CoverageEvaluator,
    pub gaps: GapAnalyzer,
}

/// Thin wrapper so phases can report while holding borrows of other context fields
#[derive(Clone, Copy)]
pub struct StageEvents<'a> {
    handler: &'a dyn ProgressHandler,
}

impl<'a> StageEvents<'a> {
    pub fn new(handler: &'a dyn ProgressHandler) -> Self {
        Self { handler }
    }

    pub fn started(&self, stage: StageId) {
        self.handler.on_progress(&PipelineEvent::StageStarted {
            stage,
            message: stage.title().to_string(),
        });
    }

    pub fn completed(&self, stage: StageId, duration: Duration) {
        self.handler.on_progress(&PipelineEvent::StageCompleted {
            stage,
            message: stage.title().to_string(),
            duration,
        });
    }

    pub fn skipped(&self, stage: StageId) {
        self.handler.on_progress(&PipelineEvent::StageSkipped {
            stage,
            message: format!("{} (already done)", stage.title()),
        });
    }

    pub fn failed(&self, stage: StageId, message: impl Into<String>) {
        self.handler.on_progress(&PipelineEvent::StageFailed {
            stage,
            message: message.into(),
        });
    }

    pub fn progress(&self, stage: StageId, message: impl Into<String>) {
        self.handler.on_progress(&PipelineEvent::Progress {
            stage,
            message: message.into(),
        });
    }
}

/// Coverage and gap results from stage F
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub coverage: CoverageEvaluation,
    pub gaps: GapReport,
}

pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub services: &'a Services,
    pub state: &'a mut StateManager,
    pub events: StageEvents<'a>,
    pub artifacts: ArtifactStore,

    pub clone: Lazy<CloneOutcome>,
    pub inventory: Lazy<Inventory>,
    pub stack: Lazy<StackProfile>,
    pub surfaces: Lazy<Vec<Surface>>,
    pub traceability: Lazy<TraceabilityReport>,
    pub documents: Lazy<Vec<WrittenDocument>>,
    pub evaluation: Option<Evaluation>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        config: &'a RunConfig,
        services: &'a Services,
        state: &'a mut StateManager,
        events: StageEvents<'a>,
    ) -> Self {
        Self {
            artifacts: ArtifactStore::new(config.artifact_dir()),
            config,
            services,
            state,
            events,
            clone: Lazy::new(artifacts::CLONE),
            inventory: Lazy::new(artifacts::INVENTORY),
            stack: Lazy::new(artifacts::STACK_PROFILE),
            surfaces: Lazy::new(artifacts::SURFACES),
            traceability: Lazy::new(artifacts::TRACEABILITY),
            documents: Lazy::new(artifacts::DOCUMENTS),
            evaluation: None,
        }
    }
}
