//! Report files under `<output>/reports/`, regenerated in full by each run

use super::artifacts::{load_json, ArtifactError};
use super::context::Evaluation;
use std::path::Path;

pub const COVERAGE_JSON: &str = "coverage.json";
pub const COVERAGE_MD: &str = "coverage.md";
pub const GAPS_JSON: &str = "gaps.json";
pub const GAPS_MD: &str = "gaps.md";
pub const TRACEABILITY_MD: &str = "traceability.md";

/// Read back the stage F results of an earlier run
pub fn load_evaluation(reports_dir: &Path) -> Result<Evaluation, ArtifactError> {
    Ok(Evaluation {
        coverage: load_json(&reports_dir.join(COVERAGE_JSON), "reports/coverage.json")?,
        gaps: load_json(&reports_dir.join(GAPS_JSON), "reports/gaps.json")?,
    })
}
