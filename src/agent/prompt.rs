//! Prompt templates for the research and card generation stages.
//!
//! Templates use `{placeholder}` substitution: `{instruction}` for research,
//! `{mini_lesson}`, `{min}` and `{max}` for cards.

use crate::workflow::CardCountPolicy;
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_INSTRUCTION: &str = "{instruction}";
pub const PLACEHOLDER_MINI_LESSON: &str = "{mini_lesson}";

const DEFAULT_RESEARCH_PROMPT: &str = "\
You are an expert educator. Create a comprehensive but concise mini lesson on the following topic: {instruction}

Your response should include:
1. A brief introduction to the topic
2. Key concepts and definitions
3. Important facts and details
4. Historical context if relevant
5. Examples or case studies if applicable

Keep the lesson focused and educational, suitable for creating flashcards. Aim for 3-5 paragraphs total.

Topic: {instruction}

Mini Lesson:
";

const DEFAULT_CARDS_PROMPT: &str = "\
You are an expert flashcard creator. Based on the following mini lesson, create between {min} and {max} high-quality flashcards.

Each flashcard should:
- Have a clear, specific question
- Have a concise, accurate answer
- Cover different aspects of the topic
- Be suitable for spaced repetition learning

Respond with a JSON array only, no prose and no code fences, using exactly this structure:
[
    {
        \"question\": \"What is the question?\",
        \"answer\": \"What is the answer?\",
        \"category\": \"fact | concept | definition | example\"
    }
]

Mini Lesson:
{mini_lesson}

Flashcards (JSON format only):
";

/// User-overridable prompt templates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptTemplates {
    pub research: String,
    pub cards: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            research: DEFAULT_RESEARCH_PROMPT.to_string(),
            cards: DEFAULT_CARDS_PROMPT.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn render_research(&self, instruction: &str) -> String {
        self.research.replace(PLACEHOLDER_INSTRUCTION, instruction)
    }

    pub fn render_cards(&self, mini_lesson: &str, policy: &CardCountPolicy) -> String {
        // Lesson goes last so text inside it is never treated as a placeholder
        self.cards
            .replace("{min}", &policy.min.to_string())
            .replace("{max}", &policy.max.to_string())
            .replace(PLACEHOLDER_MINI_LESSON, mini_lesson)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.research.contains(PLACEHOLDER_INSTRUCTION) {
            return Err(format!(
                "prompts.research must contain {}",
                PLACEHOLDER_INSTRUCTION
            ));
        }
        if !self.cards.contains(PLACEHOLDER_MINI_LESSON) {
            return Err(format!(
                "prompts.cards must contain {}",
                PLACEHOLDER_MINI_LESSON
            ));
        }
        Ok(())
    }
}
