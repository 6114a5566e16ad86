//! Workflow engine: typed state, stage contract, supervisor and run loop.

pub mod orchestrator;
pub mod policy;
pub mod stage;
pub mod state;
pub mod supervisor;

pub use orchestrator::{Orchestrator, OrchestratorBuilder, ORCHESTRATOR_AGENT};
pub use policy::{CardCountPolicy, OverflowMode};
pub use stage::{fail_stage, Stage, StageContext, StageId};
pub use state::{CardCategory, Flashcard, WorkflowState, WorkflowStatus, INITIAL_AGENT};
pub use supervisor::{next_transition, Transition};
