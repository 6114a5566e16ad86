//! Card generation stage: converts the mini lesson into a bounded deck.

use crate::agent::cards::parse_flashcards;
use crate::agent::prompt::PromptTemplates;
use crate::error::StageError;
use crate::workflow::{
    fail_stage, CardCountPolicy, Stage, StageContext, StageId, WorkflowState, WorkflowStatus,
};
use async_trait::async_trait;
use tracing::{info, warn};

pub struct CardGeneratorAgent {
    prompts: PromptTemplates,
    policy: CardCountPolicy,
}

impl CardGeneratorAgent {
    pub fn new(prompts: PromptTemplates, policy: CardCountPolicy) -> Self {
        Self { prompts, policy }
    }

    pub fn policy(&self) -> &CardCountPolicy {
        &self.policy
    }
}

#[async_trait]
impl Stage for CardGeneratorAgent {
    fn id(&self) -> StageId {
        StageId::CardGeneration
    }

    async fn run(&self, mut state: WorkflowState, ctx: &StageContext<'_>) -> WorkflowState {
        let id = self.id();
        let agent = id.agent_name();
        if state.is_terminal() {
            return state;
        }

        let lesson = state
            .mini_lesson()
            .filter(|lesson| !lesson.trim().is_empty())
            .filter(|_| state.status() == WorkflowStatus::ResearchComplete)
            .map(str::to_string);
        let Some(lesson) = lesson else {
            return fail_stage(
                state,
                id,
                StageError::precondition(agent, "missing lesson content"),
            );
        };
        if let Err(e) = state.begin_card_generation(agent) {
            return fail_stage(state, id, StageError::precondition(agent, e.to_string()));
        }

        let prompt = self.prompts.render_cards(&lesson, &self.policy);
        let raw = match ctx
            .generator
            .generate(&prompt, state.model_name(), ctx.options)
            .await
        {
            Ok(raw) => raw,
            Err(err) => return fail_stage(state, id, err.into()),
        };

        let deck = match parse_flashcards(&raw) {
            Ok(deck) => deck,
            Err(err) => return fail_stage(state, id, err),
        };
        if deck.recovered {
            warn!("Flashcard JSON was recovered from surrounding text");
        }
        let cards = match self.policy.apply(deck.cards, &raw) {
            Ok(cards) => cards,
            Err(err) => return fail_stage(state, id, err),
        };

        let count = cards.len();
        if let Err(e) = state.complete_card_generation(agent, cards) {
            return fail_stage(state, id, StageError::parse(e.to_string(), raw));
        }
        info!(cards = count, "Flashcards generated");
        state
    }
}
