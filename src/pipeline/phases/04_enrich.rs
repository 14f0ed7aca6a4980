use crate::enrich::{enrich_all, RequestThrottle};
use crate::pipeline::artifacts;
use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::state::StageId;
use anyhow::Result;
use async_trait::async_trait;

/// Stage C2: optional description enrichment. Never fails on a bad response.
pub struct EnrichPhase;

#[async_trait]
impl StagePhase for EnrichPhase {
    fn stage(&self) -> StageId {
        StageId::C2
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let Some(enricher) = context.services.enricher.as_deref() else {
            context
                .events
                .progress(StageId::C2, "Enrichment disabled, surfaces kept as extracted");
            return Ok(());
        };

        let surfaces = context.surfaces.get(&context.artifacts)?.clone();
        let total = surfaces.len();
        let mut throttle = RequestThrottle::per_minute(context.config.enrich_requests_per_minute);

        let (enriched, outcomes) = enrich_all(enricher, &mut throttle, surfaces).await;

        let ok = outcomes.iter().filter(|o| o.is_enriched()).count();
        context.events.progress(
            StageId::C2,
            format!("Enriched: {} of {} surfaces ({} failed)", ok, total, total - ok),
        );

        context.artifacts.save(artifacts::ENRICHMENT, &outcomes)?;
        context.artifacts.save(artifacts::SURFACES, &enriched)?;
        context.surfaces.set(enriched);
        Ok(())
    }
}
