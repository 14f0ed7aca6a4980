use crate::docs::document_id;
use crate::pipeline::artifacts;
use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::state::StageId;
use crate::surface::SurfaceType;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::debug;

/// Stage E: one requirement document per surface.
///
/// Every surface is a bean, numbered from 1 in collection order. Beans at or
/// below the last checkpoint are not rendered again.
pub struct DocumentsPhase;

#[async_trait]
impl StagePhase for DocumentsPhase {
    fn stage(&self) -> StageId {
        StageId::E
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let surfaces = context.surfaces.get(&context.artifacts)?;
        let writer = context.services.writer.as_ref();

        let mut ordinals: BTreeMap<SurfaceType, usize> = BTreeMap::new();
        let mut documents = Vec::with_capacity(surfaces.len());
        let mut reused = 0usize;

        for (index, surface) in surfaces.iter().enumerate() {
            let bean = index as u64 + 1;
            let ordinal = ordinals.entry(surface.surface_type()).or_insert(0);
            *ordinal += 1;
            let id = document_id(surface.surface_type(), *ordinal);

            let document = if context.state.should_skip_bean(bean) {
                debug!(bean, id = %id, "Bean already checkpointed");
                writer.existing(surface, &id)?
            } else {
                writer
                    .write(surface, &id)
                    .with_context(|| format!("Failed to write document {}", id))?
            };
            if document.skipped {
                reused += 1;
            }
            documents.push(document);

            // Persistence failures surface as StateError through anyhow
            context.state.record_bean(bean)?;
        }

        context.events.progress(
            StageId::E,
            format!(
                "Documents: {} written, {} already present",
                documents.len() - reused,
                reused
            ),
        );

        context.artifacts.save(artifacts::DOCUMENTS, &documents)?;
        context.documents.set(documents);
        Ok(())
    }
}
