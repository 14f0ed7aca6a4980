use crate::gaps::GapInput;
use crate::pipeline::artifacts::save_json;
use crate::pipeline::context::{Evaluation, RunContext};
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::reports;
use crate::state::StageId;
use crate::util::write_atomic;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Stage F: coverage gates and gap analysis
pub struct EvaluatePhase;

#[async_trait]
impl StagePhase for EvaluatePhase {
    fn stage(&self) -> StageId {
        StageId::F
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let surfaces = context.surfaces.get(&context.artifacts)?;
        let documents = context.documents.get(&context.artifacts)?;
        let services = context.services;

        let coverage = services.coverage.evaluate(surfaces, documents);
        let gaps = services
            .gaps
            .analyze(&GapInput::new(surfaces, documents, services.writer.as_ref()));

        for gate in coverage.failed_gates() {
            context.events.progress(
                StageId::F,
                format!(
                    "{} coverage {:.1}% below {}% gate",
                    gate.surface_type().label(),
                    gate.metrics.percentage,
                    gate.threshold
                ),
            );
        }
        context
            .events
            .progress(StageId::F, format!("Gaps: {} found", gaps.len()));

        let dir = context.config.reports_dir();
        save_json(&dir.join(reports::COVERAGE_JSON), &coverage)?;
        save_json(&dir.join(reports::GAPS_JSON), &gaps)?;
        for (name, body) in [
            (reports::COVERAGE_MD, coverage.to_markdown()),
            (reports::GAPS_MD, gaps.to_markdown()),
        ] {
            let path = dir.join(name);
            write_atomic(&path, body.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        context.evaluation = Some(Evaluation { coverage, gaps });
        Ok(())
    }
}
