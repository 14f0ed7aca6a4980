//! Gap analysis
//!
//! A fixed battery of independent queries cross-references the surface collection
//! with the written documents. Queries run one after another and their findings are
//! concatenated; a query that errors is logged and reported as a
//! [`GapCategory::QueryFailed`] entry while the remaining queries still run.

mod queries;
mod report;
pub mod schema;

pub use queries::{
    DanglingReferenceQuery, IncompleteDocumentQuery, OrphanedDataContractQuery,
    UncoveredSurfaceQuery, UndocumentedContractQuery, ACCEPTANCE_MARKERS,
};
pub use report::render_markdown;

use crate::docs::{DocumentWriter, WrittenDocument};
use crate::surface::Surface;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapCategory {
    UncoveredSurface,
    IncompleteDocument,
    UndocumentedContract,
    OrphanedDataContract,
    DanglingReference,
    QueryFailed,
}

impl GapCategory {
    pub fn label(&self) -> &'static str {
        match self {
            GapCategory::UncoveredSurface => "Uncovered surfaces",
            GapCategory::IncompleteDocument => "Incomplete documents",
            GapCategory::UndocumentedContract => "Undocumented contracts",
            GapCategory::OrphanedDataContract => "Orphaned data contracts",
            GapCategory::DanglingReference => "Dangling references",
            GapCategory::QueryFailed => "Failed queries",
        }
    }
}

impl fmt::Display for GapCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One actionable finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapEntry {
    pub category: GapCategory,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub recommended_action: String,
}

impl GapEntry {
    pub fn new(
        category: GapCategory,
        description: impl Into<String>,
        file: Option<&str>,
        recommended_action: impl Into<String>,
    ) -> Self {
        Self {
            category,
            description: description.into(),
            file: file.map(str::to_string),
            recommended_action: recommended_action.into(),
        }
    }
}

/// Everything a query may look at
pub struct GapInput<'a> {
    pub surfaces: &'a [Surface],
    pub documents: &'a [WrittenDocument],
    pub writer: &'a dyn DocumentWriter,
}

impl<'a> GapInput<'a> {
    pub fn new(
        surfaces: &'a [Surface],
        documents: &'a [WrittenDocument],
        writer: &'a dyn DocumentWriter,
    ) -> Self {
        Self {
            surfaces,
            documents,
            writer,
        }
    }
}

pub trait GapQuery: Send + Sync {
    fn name(&self) -> &'static str;

    fn run(&self, input: &GapInput<'_>) -> anyhow::Result<Vec<GapEntry>>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapReport {
    pub entries: Vec<GapEntry>,
}

impl GapReport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn by_category(&self) -> BTreeMap<GapCategory, Vec<&GapEntry>> {
        let mut grouped: BTreeMap<GapCategory, Vec<&GapEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.category).or_default().push(entry);
        }
        grouped
    }

    pub fn count(&self, category: GapCategory) -> usize {
        self.entries.iter().filter(|e| e.category == category).count()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }
}

pub struct GapAnalyzer {
    queries: Vec<Box<dyn GapQuery>>,
}

impl Default for GapAnalyzer {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl GapAnalyzer {
    pub fn new(queries: Vec<Box<dyn GapQuery>>) -> Self {
        Self { queries }
    }

    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(UncoveredSurfaceQuery),
            Box::new(IncompleteDocumentQuery),
            Box::new(UndocumentedContractQuery),
            Box::new(OrphanedDataContractQuery),
            Box::new(DanglingReferenceQuery),
        ])
    }

    pub fn analyze(&self, input: &GapInput<'_>) -> GapReport {
        let mut entries = Vec::new();
        for query in &self.queries {
            match query.run(input) {
                Ok(found) => {
                    debug!(query = query.name(), gaps = found.len(), "Gap query complete");
                    entries.extend(found);
                }
                Err(e) => {
                    warn!(query = query.name(), error = %e, "Gap query failed");
                    entries.push(GapEntry::new(
                        GapCategory::QueryFailed,
                        format!("Query '{}' failed: {:#}", query.name(), e),
                        None,
                        "Re-run the analysis after fixing the underlying error",
                    ));
                }
            }
        }
        GapReport { entries }
    }
}
