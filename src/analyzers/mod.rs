//! Surface extraction
//!
//! Analyzers turn an inventory plus the detected stack into [`Surface`] records.
//! Each analyzer decides for itself whether the stack profile is relevant; the
//! pipeline simply concatenates what every registered analyzer returns.

mod env_vars;
mod express;

pub use env_vars::EnvVarAnalyzer;
pub use express::ExpressRouteAnalyzer;

use crate::inventory::{FileEntry, Inventory};
use crate::stack::StackProfile;
use crate::surface::Surface;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze(&self, inventory: &Inventory, stack: &StackProfile, workdir: &Path) -> Result<Vec<Surface>>;
}

#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        Self::new()
            .with(Box::new(EnvVarAnalyzer::new()))
            .with(Box::new(ExpressRouteAnalyzer::new()))
    }

    pub fn register(&mut self, analyzer: Box<dyn Analyzer>) {
        self.analyzers.push(analyzer);
    }

    pub fn with(mut self, analyzer: Box<dyn Analyzer>) -> Self {
        self.register(analyzer);
        self
    }

    pub fn analyzers(&self) -> impl Iterator<Item = &dyn Analyzer> {
        self.analyzers.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

/// Read an inventory file, treating unreadable or non-UTF-8 files as absent.
pub(crate) fn read_entry(workdir: &Path, entry: &FileEntry) -> Option<String> {
    match std::fs::read_to_string(workdir.join(&entry.path)) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!(path = %entry.path, error = %e, "Skipping unreadable file");
            None
        }
    }
}

/// 1-based line number of byte `offset` in `content`
pub(crate) fn line_of(content: &str, offset: usize) -> u32 {
    content[..offset].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}
