//! Supervisor: pure transition function from the current state to the next
//! step. New stages are inserted here, not in the run loop.

use crate::workflow::stage::StageId;
use crate::workflow::state::{WorkflowState, WorkflowStatus};

/// Decision taken between stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Hand the state to this stage
    Run(StageId),
    /// Terminal state reached
    Finish,
    /// State is stuck mid-stage; fail it with this reason
    Abort(String),
}

pub fn next_transition(state: &WorkflowState) -> Transition {
    match state.status() {
        WorkflowStatus::Pending => Transition::Run(StageId::Research),
        WorkflowStatus::ResearchComplete => Transition::Run(StageId::CardGeneration),
        WorkflowStatus::CardGenerationComplete | WorkflowStatus::Failed => Transition::Finish,
        status @ (WorkflowStatus::Researching | WorkflowStatus::GeneratingCards) => {
            Transition::Abort(format!("stage returned with workflow still {}", status))
        }
    }
}
