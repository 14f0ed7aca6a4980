use crate::pipeline::artifacts;
use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::stack::{DetectionInput, StackAggregator};
use crate::state::StageId;
use crate::surface::{count_by_type, Surface};
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

/// Stage C: stack detection, then surface extraction by every analyzer
pub struct ExtractPhase;

#[async_trait]
impl StagePhase for ExtractPhase {
    fn stage(&self) -> StageId {
        StageId::C
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let repo_dir = context.clone.get(&context.artifacts)?.repo_dir.clone();
        let inventory = context.inventory.get(&context.artifacts)?;
        let services = context.services;
        let events = context.events;

        let aggregator = StackAggregator::new().with_min_confidence(context.config.min_confidence);
        let profile = aggregator.detect(&services.detectors, &DetectionInput::new(inventory, &repo_dir));

        if profile.stacks.is_empty() {
            events.progress(StageId::C, "Stacks: none above threshold");
        } else {
            let ranked: Vec<String> = profile
                .ranked()
                .iter()
                .map(|(name, confidence)| format!("{} ({:.2})", name, confidence))
                .collect();
            events.progress(StageId::C, format!("Stacks: {}", ranked.join(", ")));
        }

        let mut surfaces: Vec<Surface> = Vec::new();
        for analyzer in services.analyzers.analyzers() {
            let found = analyzer
                .analyze(inventory, &profile, &repo_dir)
                .with_context(|| format!("Analyzer '{}' failed", analyzer.name()))?;
            debug!(analyzer = analyzer.name(), surfaces = found.len(), "Analyzer complete");
            surfaces.extend(found);
        }

        for (surface_type, count) in count_by_type(&surfaces) {
            events.progress(StageId::C, format!("{}: {} found", surface_type.label(), count));
        }

        context.artifacts.save(artifacts::STACK_PROFILE, &profile)?;
        context.artifacts.save(artifacts::SURFACES, &surfaces)?;
        context.stack.set(profile);
        context.surfaces.set(surfaces);
        Ok(())
    }
}
