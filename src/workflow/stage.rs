//! Stage contract: a named unit of work that takes ownership of the workflow
//! state for the duration of its call and hands back the updated state.

use crate::error::StageError;
use crate::provider::{GenerationOptions, TextGenerator};
use crate::workflow::state::WorkflowState;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use tracing::{error, warn};

/// Identity of a stage known to the supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Research,
    CardGeneration,
}

impl StageId {
    /// Agent name recorded on the state by this stage
    pub fn agent_name(&self) -> &'static str {
        match self {
            StageId::Research => "topic_research",
            StageId::CardGeneration => "card_generator",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// Per-run collaborators lent to a stage
pub struct StageContext<'a> {
    pub generator: &'a dyn TextGenerator,
    pub options: &'a GenerationOptions,
}

impl<'a> StageContext<'a> {
    pub fn new(generator: &'a dyn TextGenerator, options: &'a GenerationOptions) -> Self {
        Self { generator, options }
    }
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn id(&self) -> StageId;

    /// Run the stage. Failures are encoded in the returned state, never raised.
    async fn run(&self, state: WorkflowState, ctx: &StageContext<'_>) -> WorkflowState;
}

/// Record a stage failure on the state. A state that is already terminal is
/// returned untouched.
pub fn fail_stage(mut state: WorkflowState, stage: StageId, err: StageError) -> WorkflowState {
    error!(
        stage = %stage,
        instruction = state.instruction(),
        error = %err,
        "Stage failed"
    );
    if let Some(raw) = err.raw_response() {
        if let Err(e) = state.record_raw_response(raw) {
            warn!(stage = %stage, error = %e, "Could not keep raw response");
        }
    }
    if let Err(e) = state.fail(stage.agent_name(), err.to_string()) {
        warn!(stage = %stage, error = %e, "Ignoring failure on finished workflow");
    }
    state
}
