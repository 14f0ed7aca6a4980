use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::{artifacts, reports};
use crate::state::StageId;
use crate::trace::TraceabilityBuilder;
use crate::util::write_atomic;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Stage D: cross-reference surfaces against each other
pub struct TracePhase;

#[async_trait]
impl StagePhase for TracePhase {
    fn stage(&self) -> StageId {
        StageId::D
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let inventory = context.inventory.get(&context.artifacts)?;
        let surfaces = context.surfaces.get(&context.artifacts)?;

        let report = TraceabilityBuilder::new()
            .with_known_files(inventory.files.iter().map(|f| f.path.as_str()))
            .build(surfaces);

        context.events.progress(
            StageId::D,
            format!(
                "Links: {} resolved, {} orphans",
                report.link_count(),
                report.orphan_count()
            ),
        );

        let path = context.config.reports_dir().join(reports::TRACEABILITY_MD);
        write_atomic(&path, report.to_markdown().as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        context.artifacts.save(artifacts::TRACEABILITY, &report)?;
        context.traceability.set(report);
        Ok(())
    }
}
