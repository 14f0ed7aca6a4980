use super::detectors::{ManifestDependencyDetector, MarkerFileDetector};
use super::Signal;
use crate::inventory::Inventory;
use anyhow::Result;
use std::path::Path;

/// What a detector gets to look at
pub struct DetectionInput<'a> {
    pub inventory: &'a Inventory,
    pub workdir: &'a Path,
}

impl<'a> DetectionInput<'a> {
    pub fn new(inventory: &'a Inventory, workdir: &'a Path) -> Self {
        Self { inventory, workdir }
    }

    /// Read a repository-relative file. Unreadable files are treated as absent.
    pub fn read(&self, rel_path: &str) -> Option<String> {
        std::fs::read_to_string(self.workdir.join(rel_path)).ok()
    }
}

/// An independent source of stack evidence
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    fn detect(&self, input: &DetectionInput<'_>) -> Result<Vec<Signal>>;
}

/// Detectors consulted for one run
///
/// Constructed per run and handed to the aggregator, so tests can build a
/// registry with exactly the detectors they need.
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ManifestDependencyDetector::with_defaults()));
        registry.register(Box::new(MarkerFileDetector::with_defaults()));
        registry
    }

    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    pub fn with(mut self, detector: Box<dyn Detector>) -> Self {
        self.register(detector);
        self
    }

    pub fn detectors(&self) -> impl Iterator<Item = &dyn Detector> {
        self.detectors.iter().map(|d| d.as_ref())
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
