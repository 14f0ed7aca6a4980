use super::CoverageEvaluation;
use std::fmt::Write as _;

/// Human-readable coverage table
pub fn render_markdown(evaluation: &CoverageEvaluation) -> String {
    let mut out = String::from("# Coverage Report\n\n");
    let _ = writeln!(
        out,
        "**Overall:** {}\n",
        if evaluation.passed { "PASS" } else { "FAIL" }
    );

    out.push_str("| Category | Total | Covered | Coverage | Threshold | Status |\n");
    out.push_str("|---|---:|---:|---:|---:|---|\n");
    for gate in &evaluation.gates {
        let m = &gate.metrics;
        let status = if m.total == 0 {
            "n/a"
        } else if gate.passed {
            "pass"
        } else {
            "FAIL"
        };
        let _ = writeln!(
            out,
            "| {} | {} | {} | {:.1}% | {:.0}% | {} |",
            m.surface_type.label(),
            m.total,
            m.covered,
            m.percentage,
            gate.threshold,
            status
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::test_support::documents;
    use super::super::CoverageEvaluator;
    use super::*;
    use crate::surface::fixtures::route;
    use crate::surface::{Surface, SurfaceType};

    #[test]
    fn test_markdown_table() {
        let surfaces: Vec<Surface> = (0..57).map(|i| route(&format!("/r{}", i), &[], &[])).collect();
        let evaluation =
            CoverageEvaluator::new().evaluate(&surfaces, &documents(SurfaceType::Route, 42));
        let markdown = render_markdown(&evaluation);

        assert!(markdown.contains("**Overall:** FAIL"));
        assert!(markdown.contains("| Routes | 57 | 42 | 73.7% | 95% | FAIL |"));
        assert!(markdown.contains("| UI flows | 0 | 0 | 100.0% | 75% | n/a |"));
    }
}
