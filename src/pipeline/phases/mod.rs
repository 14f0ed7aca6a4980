// Stage phases, in run order.
//
// Each phase reads what it needs from the run context (loading artifacts left by
// an earlier run when the producing stage was skipped) and persists its own
// outputs before returning.

#[path = "01_clone.rs"]
pub mod clone;
#[path = "02_inventory.rs"]
pub mod inventory;
#[path = "03_extract.rs"]
pub mod extract;
#[path = "04_enrich.rs"]
pub mod enrich;
#[path = "05_trace.rs"]
pub mod trace;
#[path = "06_documents.rs"]
pub mod documents;
#[path = "07_evaluate.rs"]
pub mod evaluate;

use super::phase_trait::StagePhase;

pub use clone::ClonePhase;
pub use documents::DocumentsPhase;
pub use enrich::EnrichPhase;
pub use evaluate::EvaluatePhase;
pub use extract::ExtractPhase;
pub use inventory::InventoryPhase;
pub use trace::TracePhase;

/// All phases in stage order A, B, C, C2, D, E, F
pub fn all() -> Vec<Box<dyn StagePhase>> {
    vec![
        Box::new(ClonePhase),
        Box::new(InventoryPhase),
        Box::new(ExtractPhase),
        Box::new(EnrichPhase),
        Box::new(TracePhase),
        Box::new(DocumentsPhase),
        Box::new(EvaluatePhase),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StageId;

    #[test]
    fn test_phases_follow_stage_order() {
        let stages: Vec<StageId> = all().iter().map(|p| p.stage()).collect();
        assert_eq!(stages, StageId::ALL.to_vec());
    }
}
