//! Research stage: turns the instruction into a short factual lesson.

use crate::agent::prompt::PromptTemplates;
use crate::error::{ProviderError, StageError};
use crate::workflow::{fail_stage, Stage, StageContext, StageId, WorkflowState};
use async_trait::async_trait;
use tracing::{debug, info};

/// Leading request phrases removed when deriving a topic, longest first
const REQUEST_PREFIXES: &[&str] = &[
    "generate flashcards about",
    "generate flashcards on",
    "generate flashcards for",
    "generate cards about",
    "generate cards on",
    "create flashcards about",
    "create flashcards on",
    "create flashcards for",
    "create cards about",
    "create cards on",
    "make flashcards about",
    "make flashcards on",
    "make cards about",
    "flashcards about",
    "flashcards on",
    "teach me about",
    "tell me about",
    "i want to learn about",
    "help me learn",
    "explain",
    "describe",
    "learn about",
];

/// Best-effort subject label for an instruction
pub fn extract_topic(instruction: &str) -> String {
    let trimmed = instruction.trim();

    let mut topic = trimmed;
    for prefix in REQUEST_PREFIXES {
        let (Some(head), Some(rest)) = (trimmed.get(..prefix.len()), trimmed.get(prefix.len()..))
        else {
            continue;
        };
        if head.eq_ignore_ascii_case(prefix)
            && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        {
            topic = rest;
            break;
        }
    }

    let topic = topic
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';' | ':'))
        .trim();
    if topic.is_empty() {
        trimmed.to_string()
    } else {
        topic.to_string()
    }
}

pub struct ResearchAgent {
    prompts: PromptTemplates,
}

impl ResearchAgent {
    pub fn new(prompts: PromptTemplates) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl Stage for ResearchAgent {
    fn id(&self) -> StageId {
        StageId::Research
    }

    async fn run(&self, mut state: WorkflowState, ctx: &StageContext<'_>) -> WorkflowState {
        let id = self.id();
        let agent = id.agent_name();
        if state.is_terminal() {
            return state;
        }
        if state.instruction().trim().is_empty() {
            return fail_stage(state, id, StageError::precondition(agent, "missing instruction"));
        }
        // A re-run on a researched state keeps its status and only replaces
        // topic and lesson
        if state.mini_lesson().is_none() {
            if let Err(e) = state.begin_research(agent) {
                return fail_stage(state, id, StageError::precondition(agent, e.to_string()));
            }
        }

        let topic = extract_topic(state.instruction());
        info!(topic = %topic, "Researching topic");
        let prompt = self.prompts.render_research(state.instruction());

        let lesson = match ctx
            .generator
            .generate(&prompt, state.model_name(), ctx.options)
            .await
        {
            Ok(lesson) if lesson.trim().is_empty() => {
                let err = ProviderError::malformed(
                    ctx.generator.provider_name(),
                    "empty lesson returned by model",
                );
                return fail_stage(state, id, err.into());
            }
            Ok(lesson) => lesson,
            Err(err) => return fail_stage(state, id, err.into()),
        };
        debug!(lesson_len = lesson.len(), "Mini lesson generated");

        if let Err(e) = state.complete_research(agent, topic, lesson) {
            return fail_stage(state, id, StageError::precondition(agent, e.to_string()));
        }
        state
    }
}
