//! Orchestrator: owns the run loop that feeds one workflow state through the
//! registered stages until the supervisor reports a terminal state.
//!
//! The orchestrator is built once and shared; every `run` call creates and
//! owns a fresh [`WorkflowState`], so concurrent runs never share mutable data.

use crate::agent::{CardGeneratorAgent, ResearchAgent};
use crate::config::WorkflowSettings;
use crate::error::StageError;
use crate::provider::{GenerationOptions, TextGenerator};
use crate::workflow::stage::{fail_stage, Stage, StageContext, StageId};
use crate::workflow::state::{WorkflowState, WorkflowStatus};
use crate::workflow::supervisor::{next_transition, Transition};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Agent label recorded when the orchestrator itself fails a run
pub const ORCHESTRATOR_AGENT: &str = "orchestrator";

/// Upper bound on loop iterations for one run
const MAX_STEPS: usize = 8;

pub struct Orchestrator {
    generator: Arc<dyn TextGenerator>,
    stages: HashMap<StageId, Arc<dyn Stage>>,
    options: GenerationOptions,
    stage_timeout: Option<Duration>,
}

impl Orchestrator {
    /// Orchestrator with the research and card generation stages registered
    pub fn new(generator: Arc<dyn TextGenerator>, settings: &WorkflowSettings) -> Self {
        Self::builder(generator)
            .stage(Arc::new(ResearchAgent::new(settings.prompts.clone())))
            .stage(Arc::new(CardGeneratorAgent::new(
                settings.prompts.clone(),
                settings.cards.clone(),
            )))
            .stage_timeout(settings.stage_timeout())
            .build()
    }

    pub fn builder(generator: Arc<dyn TextGenerator>) -> OrchestratorBuilder {
        OrchestratorBuilder {
            generator,
            stages: HashMap::new(),
            options: GenerationOptions::default(),
            stage_timeout: None,
        }
    }

    pub fn with_generation_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn generator(&self) -> &Arc<dyn TextGenerator> {
        &self.generator
    }

    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout
    }

    /// Run one workflow to completion. Failures are encoded in the returned
    /// state; this never errors. Dropping the future cancels the in-flight
    /// generation call.
    pub async fn run(&self, instruction: &str, model_name: &str) -> WorkflowState {
        let span = info_span!("workflow", instruction = %instruction, model = %model_name);
        self.drive(WorkflowState::new(instruction, model_name))
            .instrument(span)
            .await
    }

    async fn drive(&self, mut state: WorkflowState) -> WorkflowState {
        let started = Instant::now();
        let ctx = StageContext::new(self.generator.as_ref(), &self.options);
        info!(provider = self.generator.provider_name(), "Workflow started");

        for _ in 0..MAX_STEPS {
            match next_transition(&state) {
                Transition::Finish => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    if state.is_failed() {
                        warn!(
                            error = state.error().unwrap_or_default(),
                            agent = state.agent(),
                            elapsed_ms,
                            "Workflow failed"
                        );
                    } else {
                        info!(
                            cards = state.flashcards().len(),
                            topic = state.topic().unwrap_or_default(),
                            elapsed_ms,
                            "Workflow completed"
                        );
                    }
                    return state;
                }
                Transition::Abort(reason) => return abort(state, reason),
                Transition::Run(id) => {
                    let Some(stage) = self.stages.get(&id) else {
                        return abort(state, format!("no stage registered for {}", id));
                    };
                    let before = state.status();
                    state = self.run_stage(stage.as_ref(), state, &ctx).await;
                    if let Err(reason) = check_progress(id, before, &state) {
                        state = abort(state, reason);
                    }
                }
            }
        }

        abort(state, format!("workflow exceeded {} steps", MAX_STEPS))
    }

    async fn run_stage(
        &self,
        stage: &dyn Stage,
        state: WorkflowState,
        ctx: &StageContext<'_>,
    ) -> WorkflowState {
        let id = stage.id();
        let started = Instant::now();
        debug!(stage = %id, status = %state.status(), "Stage started");

        let state = match self.stage_timeout {
            Some(limit) => {
                let snapshot = state.clone();
                match tokio::time::timeout(limit, stage.run(state, ctx)).await {
                    Ok(state) => state,
                    Err(_) => fail_stage(
                        snapshot,
                        id,
                        StageError::Timeout {
                            stage: id.agent_name(),
                            timeout: limit,
                        },
                    ),
                }
            }
            None => stage.run(state, ctx).await,
        };

        debug!(
            stage = %id,
            status = %state.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Stage finished"
        );
        state
    }
}

/// A stage must either fail the state or move it strictly forward, leaving
/// it internally consistent.
fn check_progress(id: StageId, before: WorkflowStatus, state: &WorkflowState) -> Result<(), String> {
    if !state.is_failed() && state.status().rank() <= before.rank() {
        return Err(format!(
            "{} did not advance the workflow (from {} to {})",
            id,
            before,
            state.status()
        ));
    }
    state.check_invariants().map_err(|e| e.to_string())
}

fn abort(mut state: WorkflowState, reason: String) -> WorkflowState {
    error!(reason = %reason, status = %state.status(), "Aborting workflow");
    if let Err(e) = state.fail(ORCHESTRATOR_AGENT, reason) {
        warn!(error = %e, "Workflow already terminal, abort ignored");
    }
    state
}

/// Assemble an orchestrator from individually registered stages
pub struct OrchestratorBuilder {
    generator: Arc<dyn TextGenerator>,
    stages: HashMap<StageId, Arc<dyn Stage>>,
    options: GenerationOptions,
    stage_timeout: Option<Duration>,
}

impl OrchestratorBuilder {
    /// Register a stage, replacing any previous stage with the same id
    pub fn stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.insert(stage.id(), stage);
        self
    }

    pub fn options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            generator: self.generator,
            stages: self.stages,
            options: self.options,
            stage_timeout: self.stage_timeout,
        }
    }
}
