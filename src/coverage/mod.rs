//! Coverage evaluation
//!
//! Compares how many surfaces of each category were extracted with how many
//! documents of that category were written, and checks the ratio against a fixed
//! per-category threshold. A category with no surfaces passes at 100%.

mod report;

use crate::docs::WrittenDocument;
use crate::surface::{Surface, SurfaceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use report::render_markdown;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetrics {
    pub surface_type: SurfaceType,
    pub total: usize,
    pub covered: usize,
    pub percentage: f64,
}

impl CoverageMetrics {
    pub fn new(surface_type: SurfaceType, total: usize, covered: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            covered as f64 / total as f64 * 100.0
        };
        Self {
            surface_type,
            total,
            covered,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    #[serde(flatten)]
    pub metrics: CoverageMetrics,
    pub threshold: f64,
    pub passed: bool,
}

impl GateResult {
    pub fn evaluate(metrics: CoverageMetrics, threshold: f64) -> Self {
        let passed = metrics.total == 0 || metrics.percentage >= threshold;
        Self {
            metrics,
            threshold,
            passed,
        }
    }

    pub fn surface_type(&self) -> SurfaceType {
        self.metrics.surface_type
    }

    /// Failed gate with at least one surface
    pub fn is_gap(&self) -> bool {
        !self.passed && self.metrics.total > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageEvaluation {
    pub gates: Vec<GateResult>,
    pub passed: bool,
}

impl CoverageEvaluation {
    pub fn gate(&self, surface_type: SurfaceType) -> Option<&GateResult> {
        self.gates.iter().find(|g| g.surface_type() == surface_type)
    }

    pub fn failed_gates(&self) -> impl Iterator<Item = &GateResult> {
        self.gates.iter().filter(|g| !g.passed)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_markdown(&self) -> String {
        render_markdown(self)
    }
}

/// Per-category coverage gates
#[derive(Debug, Clone)]
pub struct CoverageEvaluator {
    thresholds: BTreeMap<SurfaceType, f64>,
}

impl Default for CoverageEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageEvaluator {
    pub fn new() -> Self {
        Self {
            thresholds: SurfaceType::all()
                .iter()
                .map(|t| (*t, t.coverage_threshold()))
                .collect(),
        }
    }

    pub fn with_threshold(mut self, surface_type: SurfaceType, threshold: f64) -> Self {
        self.thresholds.insert(surface_type, threshold);
        self
    }

    pub fn threshold(&self, surface_type: SurfaceType) -> f64 {
        self.thresholds
            .get(&surface_type)
            .copied()
            .unwrap_or_else(|| surface_type.coverage_threshold())
    }

    /// Totals and covered counts for every category, in declaration order.
    ///
    /// `covered` is the number of documents of that category, skipped ones included
    /// since they exist on disk from a previous run.
    pub fn metrics(&self, surfaces: &[Surface], documents: &[WrittenDocument]) -> Vec<CoverageMetrics> {
        let mut totals: BTreeMap<SurfaceType, usize> = BTreeMap::new();
        for surface in surfaces {
            *totals.entry(surface.surface_type()).or_default() += 1;
        }
        let mut covered: BTreeMap<SurfaceType, usize> = BTreeMap::new();
        for document in documents {
            *covered.entry(document.surface_type).or_default() += 1;
        }

        SurfaceType::all()
            .iter()
            .map(|t| {
                CoverageMetrics::new(
                    *t,
                    totals.get(t).copied().unwrap_or(0),
                    covered.get(t).copied().unwrap_or(0),
                )
            })
            .collect()
    }

    pub fn evaluate(&self, surfaces: &[Surface], documents: &[WrittenDocument]) -> CoverageEvaluation {
        let gates: Vec<GateResult> = self
            .metrics(surfaces, documents)
            .into_iter()
            .map(|m| {
                let threshold = self.threshold(m.surface_type);
                GateResult::evaluate(m, threshold)
            })
            .collect();
        let passed = gates.iter().all(|g| g.passed);
        CoverageEvaluation { gates, passed }
    }
}
