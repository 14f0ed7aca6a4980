use super::context::RunContext;
use crate::state::StageId;
use anyhow::Result;
use async_trait::async_trait;

/// One stage of the run. A phase stores its outputs in the context and persists
/// them as artifacts before returning.
#[async_trait]
pub trait StagePhase: Send + Sync {
    fn stage(&self) -> StageId;

    async fn execute(&self, context: &mut RunContext<'_>) -> Result<()>;
}
