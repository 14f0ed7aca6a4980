//! Requirement documents ("beans")
//!
//! Stage E hands every surface to a [`DocumentWriter`] together with an assigned id.
//! `write` always renders the current surface, replacing whatever sits at the path.
//! Stage E only calls it for beans past the last checkpoint; checkpointed beans go
//! through `existing` so a resumed run never rewrites them.

mod markdown;

pub use markdown::{MarkdownWriter, ACCEPTANCE_CRITERIA_HEADING};

use crate::surface::{Surface, SurfaceType};
use serde::{Deserialize, Serialize};

/// One generated requirement file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenDocument {
    pub surface_type: SurfaceType,
    pub id: String,
    pub title: String,
    /// Path relative to the output directory
    pub path: String,
    /// Reused from a checkpointed prior run and not rewritten
    pub skipped: bool,
}

pub trait DocumentWriter: Send + Sync {
    /// Render and write the document for `surface`, replacing any file at its path.
    fn write(&self, surface: &Surface, id: &str) -> anyhow::Result<WrittenDocument>;

    /// Describe the document for `surface` without touching the filesystem.
    fn existing(&self, surface: &Surface, id: &str) -> anyhow::Result<WrittenDocument>;

    /// Read back the body of a document previously returned by this writer.
    fn read_body(&self, document: &WrittenDocument) -> anyhow::Result<String>;
}

/// `ROUTE-007` style id for the `ordinal`-th surface (1-based) of a category
pub fn document_id(surface_type: SurfaceType, ordinal: usize) -> String {
    format!("{}-{:03}", surface_type.id_prefix(), ordinal)
}
