use crate::pipeline::artifacts;
use crate::pipeline::context::RunContext;
use crate::pipeline::phase_trait::StagePhase;
use crate::source::{CloneOutcome, SourceLocation};
use crate::state::StageId;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tracing::info;

/// Stage A: obtain the working copy
pub struct ClonePhase;

#[async_trait]
impl StagePhase for ClonePhase {
    fn stage(&self) -> StageId {
        StageId::A
    }

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()> {
        let outcome = match &context.config.source {
            SourceLocation::Local { path } => {
                if !path.is_dir() {
                    bail!("Source directory {} does not exist", path.display());
                }
                let repo_dir = path
                    .canonicalize()
                    .with_context(|| format!("Failed to resolve {}", path.display()))?;
                info!(repo = %repo_dir.display(), "Analyzing local directory in place");
                CloneOutcome::local(repo_dir)
            }
            SourceLocation::Remote { url, git_ref } => {
                let cloner = context.services.cloner.as_ref();
                info!(url = %url, git_ref = ?git_ref, cloner = cloner.name(), "Cloning repository");
                cloner
                    .clone_repo(url, git_ref.as_deref(), context.artifacts.dir())
                    .await
                    .with_context(|| format!("Failed to clone {}", url))?
            }
        };

        context.events.progress(
            StageId::A,
            format!(
                "Working copy at {} ({} symlinks removed, {} files normalized)",
                outcome.repo_dir.display(),
                outcome.skipped_symlinks,
                outcome.normalized_file_count
            ),
        );

        context.artifacts.save(artifacts::CLONE, &outcome)?;
        context.clone.set(outcome);
        Ok(())
    }
}
