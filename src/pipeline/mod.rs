//! Resumable analysis pipeline
//!
//! Stages A through F run strictly in order. Each completed stage is recorded in
//! `<output>/.specmine/state.json`, and its outputs are written next to it as JSON
//! artifacts so a resumed run can skip straight to the first unfinished stage.

pub mod artifacts;
pub mod config;
pub mod context;
pub mod orchestrator;
pub mod phase_trait;
pub mod phases;
pub mod reports;

pub use artifacts::{ArtifactError, ArtifactStore};
pub use config::{state_path, RunConfig};
pub use context::{Evaluation, Services};
pub use orchestrator::{Pipeline, PipelineError, PipelineResult};

/// Directory under the output root holding state and stage artifacts
pub const ARTIFACT_DIR: &str = ".specmine";
pub const REPORTS_DIR: &str = "reports";
pub const STATE_FILE: &str = "state.json";
