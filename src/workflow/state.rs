//! Workflow state: the single record threaded through every stage.
//!
//! Fields are private and only change through the transition methods below,
//! which keep `status`, `mini_lesson`, `flashcards` and `error` consistent.

use crate::error::StateError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline position of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Researching,
    ResearchComplete,
    GeneratingCards,
    CardGenerationComplete,
    Failed,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Pending => "pending",
            WorkflowStatus::Researching => "researching",
            WorkflowStatus::ResearchComplete => "research_complete",
            WorkflowStatus::GeneratingCards => "generating_cards",
            WorkflowStatus::CardGenerationComplete => "card_generation_complete",
            WorkflowStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::CardGenerationComplete | WorkflowStatus::Failed
        )
    }

    /// Position on the success path; `Failed` has no rank
    pub fn rank(&self) -> Option<u8> {
        match self {
            WorkflowStatus::Pending => Some(0),
            WorkflowStatus::Researching => Some(1),
            WorkflowStatus::ResearchComplete => Some(2),
            WorkflowStatus::GeneratingCards => Some(3),
            WorkflowStatus::CardGenerationComplete => Some(4),
            WorkflowStatus::Failed => None,
        }
    }

    /// Whether `mini_lesson` must be present in this status
    fn requires_lesson(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::ResearchComplete
                | WorkflowStatus::GeneratingCards
                | WorkflowStatus::CardGenerationComplete
        )
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Open, string-backed card category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardCategory {
    Fact,
    Concept,
    Definition,
    Example,
    Other(String),
}

impl CardCategory {
    pub fn as_str(&self) -> &str {
        match self {
            CardCategory::Fact => "fact",
            CardCategory::Concept => "concept",
            CardCategory::Definition => "definition",
            CardCategory::Example => "example",
            CardCategory::Other(other) => other,
        }
    }
}

impl From<String> for CardCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "fact" => CardCategory::Fact,
            "concept" => CardCategory::Concept,
            "definition" => CardCategory::Definition,
            "example" => CardCategory::Example,
            _ => CardCategory::Other(value.trim().to_string()),
        }
    }
}

impl From<&str> for CardCategory {
    fn from(value: &str) -> Self {
        CardCategory::from(value.to_string())
    }
}

impl From<CardCategory> for String {
    fn from(value: CardCategory) -> Self {
        match value {
            CardCategory::Other(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A question/answer/category triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
    pub category: CardCategory,
}

impl Flashcard {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<CardCategory>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
        }
    }

    /// All three fields present and non-blank
    pub fn is_complete(&self) -> bool {
        !self.question.trim().is_empty()
            && !self.answer.trim().is_empty()
            && !self.category.as_str().trim().is_empty()
    }
}

/// Agent label used before any stage has run
pub const INITIAL_AGENT: &str = "initial";

/// Shared record threaded through the pipeline
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowState {
    instruction: String,
    model_name: String,
    topic: Option<String>,
    mini_lesson: Option<String>,
    flashcards: Vec<Flashcard>,
    status: WorkflowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    agent: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
}

impl WorkflowState {
    /// Fresh state for one request
    pub fn new(instruction: impl Into<String>, model_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            instruction: instruction.into(),
            model_name: model_name.into(),
            topic: None,
            mini_lesson: None,
            flashcards: Vec::new(),
            status: WorkflowStatus::Pending,
            error: None,
            agent: INITIAL_AGENT.to_string(),
            created_at: now,
            updated_at: now,
            raw_response: None,
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn mini_lesson(&self) -> Option<&str> {
        self.mini_lesson.as_deref()
    }

    pub fn flashcards(&self) -> &[Flashcard] {
        &self.flashcards
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Unparsed model output kept when card parsing failed
    pub fn raw_response(&self) -> Option<&str> {
        self.raw_response.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_failed(&self) -> bool {
        self.status == WorkflowStatus::Failed
    }

    /// `pending -> researching`
    pub fn begin_research(&mut self, agent: &str) -> Result<(), StateError> {
        self.advance(
            &[WorkflowStatus::Pending],
            WorkflowStatus::Researching,
            agent,
        )
    }

    /// `researching -> research_complete`. Also accepted on an already
    /// researched state, where only topic and lesson are overwritten.
    pub fn complete_research(
        &mut self,
        agent: &str,
        topic: impl Into<String>,
        lesson: impl Into<String>,
    ) -> Result<(), StateError> {
        let lesson = lesson.into();
        if lesson.trim().is_empty() {
            return Err(StateError::InvalidContent(
                "mini lesson cannot be empty".to_string(),
            ));
        }
        self.advance(
            &[
                WorkflowStatus::Researching,
                WorkflowStatus::ResearchComplete,
            ],
            WorkflowStatus::ResearchComplete,
            agent,
        )?;
        let topic = topic.into();
        self.topic = (!topic.trim().is_empty()).then_some(topic);
        self.mini_lesson = Some(lesson);
        Ok(())
    }

    /// `research_complete -> generating_cards`
    pub fn begin_card_generation(&mut self, agent: &str) -> Result<(), StateError> {
        self.advance(
            &[WorkflowStatus::ResearchComplete],
            WorkflowStatus::GeneratingCards,
            agent,
        )
    }

    /// `generating_cards -> card_generation_complete`, appending the deck
    pub fn complete_card_generation(
        &mut self,
        agent: &str,
        cards: Vec<Flashcard>,
    ) -> Result<(), StateError> {
        if cards.is_empty() {
            return Err(StateError::InvalidContent(
                "flashcard deck cannot be empty".to_string(),
            ));
        }
        if let Some(index) = cards.iter().position(|card| !card.is_complete()) {
            return Err(StateError::InvalidContent(format!(
                "flashcard {} has an empty field",
                index + 1
            )));
        }
        self.advance(
            &[WorkflowStatus::GeneratingCards],
            WorkflowStatus::CardGenerationComplete,
            agent,
        )?;
        self.flashcards.extend(cards);
        Ok(())
    }

    /// Any non-terminal status -> `failed`
    pub fn fail(&mut self, agent: &str, message: impl Into<String>) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(StateError::Terminal(self.status));
        }
        let message = message.into();
        self.error = Some(if message.trim().is_empty() {
            "unknown failure".to_string()
        } else {
            message
        });
        self.status = WorkflowStatus::Failed;
        self.touch(agent);
        Ok(())
    }

    /// Attach raw model output for debugging a failed parse
    pub fn record_raw_response(&mut self, raw: impl Into<String>) -> Result<(), StateError> {
        if self.status == WorkflowStatus::CardGenerationComplete {
            return Err(StateError::Terminal(self.status));
        }
        self.raw_response = Some(raw.into());
        Ok(())
    }

    /// Verify status and populated fields agree
    pub fn check_invariants(&self) -> Result<(), StateError> {
        if self.error.is_some() != self.is_failed() {
            return Err(StateError::Invariant(format!(
                "error must be set exactly when failed (status {}, error present: {})",
                self.status,
                self.error.is_some()
            )));
        }
        let has_lesson = self
            .mini_lesson
            .as_deref()
            .is_some_and(|lesson| !lesson.trim().is_empty());
        if self.status.requires_lesson() && !has_lesson {
            return Err(StateError::Invariant(format!(
                "status {} requires a mini lesson",
                self.status
            )));
        }
        if matches!(
            self.status,
            WorkflowStatus::Pending | WorkflowStatus::Researching
        ) && self.mini_lesson.is_some()
        {
            return Err(StateError::Invariant(format!(
                "status {} cannot carry a mini lesson",
                self.status
            )));
        }
        let complete = self.status == WorkflowStatus::CardGenerationComplete;
        if complete == self.flashcards.is_empty() {
            return Err(StateError::Invariant(format!(
                "flashcards must be non-empty exactly when complete (status {}, {} cards)",
                self.status,
                self.flashcards.len()
            )));
        }
        Ok(())
    }

    fn advance(
        &mut self,
        allowed_from: &[WorkflowStatus],
        to: WorkflowStatus,
        agent: &str,
    ) -> Result<(), StateError> {
        if self.status.is_terminal() {
            return Err(StateError::Terminal(self.status));
        }
        if !allowed_from.contains(&self.status) {
            return Err(StateError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.touch(agent);
        Ok(())
    }

    fn touch(&mut self, agent: &str) {
        self.agent = agent.to_string();
        self.updated_at = Utc::now();
    }
}
