//! Traceability between surfaces
//!
//! Seven independent link maps relate one surface category to another. Each map
//! resolves the references declared on the source side, records what could not be
//! resolved, and lists orphans on both sides. Building a report never mutates the
//! surfaces, so it can be re-run any number of times.

mod builder;
mod report;

pub use builder::TraceabilityBuilder;
pub use report::render_markdown;

use crate::surface::SurfaceType;
use serde::{Deserialize, Serialize};

/// What a map's targets are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceTarget {
    Surface(SurfaceType),
    File,
}

impl TraceTarget {
    pub fn label(&self) -> &'static str {
        match self {
            TraceTarget::Surface(t) => t.label(),
            TraceTarget::File => "Files",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRow {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub resolved: Vec<String>,
    pub unresolved: Vec<String>,
}

impl TraceRow {
    pub fn is_linked(&self) -> bool {
        !self.resolved.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMap {
    pub title: String,
    pub source_type: SurfaceType,
    pub target: TraceTarget,
    pub rows: Vec<TraceRow>,
    /// Sources that resolved no reference at all
    pub orphan_sources: Vec<String>,
    /// Targets no source ever referenced
    pub orphan_targets: Vec<String>,
}

impl TraceMap {
    pub fn link_count(&self) -> usize {
        self.rows.iter().map(|r| r.resolved.len()).sum()
    }

    pub fn unresolved_count(&self) -> usize {
        self.rows.iter().map(|r| r.unresolved.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceabilityReport {
    pub maps: Vec<TraceMap>,
}

impl TraceabilityReport {
    pub fn map(&self, title: &str) -> Option<&TraceMap> {
        self.maps.iter().find(|m| m.title == title)
    }

    pub fn link_count(&self) -> usize {
        self.maps.iter().map(TraceMap::link_count).sum()
    }

    pub fn orphan_count(&self) -> usize {
        self.maps
            .iter()
            .map(|m| m.orphan_sources.len() + m.orphan_targets.len())
            .sum()
    }

    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }
}
