use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::pipeline::{artifacts, ARTIFACT_DIR};
use crate::state::StageId;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Stage B: file inventory of the working copy
pub struct InventoryPhase;

#[async_trait]
impl StagePhase for InventoryPhase {
    fn stage(&self) -> StageId {
        StageId::B
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let repo_dir = context.clone.get(&context.artifacts)?.repo_dir.clone();

        // Output may live inside an in-place local repository
        let mut scan = context.config.scan.clone();
        if !scan.excluded_dirs.iter().any(|d| d == ARTIFACT_DIR) {
            scan.excluded_dirs.push(ARTIFACT_DIR.to_string());
        }

        let inventory = context
            .services
            .scanner
            .scan(&repo_dir, &scan)
            .with_context(|| format!("Inventory scan of {} failed", repo_dir.display()))?;

        context.events.progress(
            StageId::B,
            format!(
                "Files: {} inventoried, {} skipped ({} bytes)",
                inventory.totals.files,
                inventory.skipped.len(),
                inventory.totals.bytes
            ),
        );

        context.artifacts.save(artifacts::INVENTORY, &inventory)?;
        context.inventory.set(inventory);
        Ok(())
    }
}
