//! Result assembler: maps a finished workflow state to the response payload.

use crate::workflow::{CardCountPolicy, Flashcard, WorkflowState, WorkflowStatus};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInfo {
    pub agent: String,
    /// RFC 3339, UTC
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardResponse {
    pub instruction: String,
    pub mini_lesson: String,
    pub flashcards: Vec<Flashcard>,
    pub status: WorkflowStatus,
    pub workflow_info: WorkflowInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub instruction: String,
    pub error: String,
    pub status: WorkflowStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowResponse {
    Success(FlashcardResponse),
    Error(ErrorResponse),
}

impl WorkflowResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowResponse::Success(_))
    }

    pub fn instruction(&self) -> &str {
        match self {
            WorkflowResponse::Success(response) => &response.instruction,
            WorkflowResponse::Error(response) => &response.instruction,
        }
    }
}

pub struct ResultAssembler {
    policy: CardCountPolicy,
}

impl ResultAssembler {
    pub fn new(policy: CardCountPolicy) -> Self {
        Self { policy }
    }

    pub fn assemble(&self, state: WorkflowState) -> WorkflowResponse {
        match state.status() {
            WorkflowStatus::CardGenerationComplete => self.success(state),
            WorkflowStatus::Failed => {
                let error = state.error().unwrap_or("unknown failure").to_string();
                error_response(state, error)
            }
            status => {
                warn!(status = %status, "Assembling a workflow that never finished");
                error_response(state, format!("workflow did not finish (status {})", status))
            }
        }
    }

    fn success(&self, state: WorkflowState) -> WorkflowResponse {
        let count = state.flashcards().len();
        if !self.policy.contains(count) {
            warn!(
                cards = count,
                min = self.policy.min,
                max = self.policy.max,
                "Rejecting deck outside the configured size"
            );
            let error = format!(
                "malformed result: expected between {} and {} flashcards, got {}",
                self.policy.min, self.policy.max, count
            );
            return error_response(state, error);
        }
        let Some(mini_lesson) = state.mini_lesson().map(str::to_string) else {
            return error_response(state, "malformed result: missing mini lesson".to_string());
        };

        WorkflowResponse::Success(FlashcardResponse {
            instruction: state.instruction().to_string(),
            mini_lesson,
            flashcards: state.flashcards().to_vec(),
            status: state.status(),
            workflow_info: WorkflowInfo {
                agent: state.agent().to_string(),
                timestamp: state.updated_at().to_rfc3339(),
            },
        })
    }
}

fn error_response(state: WorkflowState, error: String) -> WorkflowResponse {
    WorkflowResponse::Error(ErrorResponse {
        instruction: state.instruction().to_string(),
        error,
        status: WorkflowStatus::Failed,
    })
}
