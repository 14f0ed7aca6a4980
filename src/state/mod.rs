//! Resumable pipeline state
//!
//! A single JSON file records which stages finished and how far the document
//! stage got. Writes are atomic; a file that fails validation is discarded and the
//! run starts over.

mod manager;
mod stage;

pub use manager::{PipelineState, StageRecord, StateError, StateManager, DEFAULT_BEAN_INTERVAL};
pub use stage::{StageId, StageStatus};
