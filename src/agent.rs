//! Workflow agents: the research and card generation stages plus the
//! prompt templates and output parsing they rely on.

pub mod card_generator;
pub mod cards;
pub mod prompt;
pub mod research;

pub use card_generator::CardGeneratorAgent;
pub use cards::{extract_first_json_array, parse_flashcards, ParsedDeck};
pub use prompt::PromptTemplates;
pub use research::{extract_topic, ResearchAgent};
