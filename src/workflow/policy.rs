//! Deck size bounds applied by the card generator and re-checked by the
//! result assembler.

use crate::error::StageError;
use crate::workflow::state::Flashcard;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What to do with a deck larger than `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowMode {
    /// Treat the response as malformed
    Reject,
    /// Keep the first `max` cards
    Truncate,
}

/// Accepted flashcard count range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardCountPolicy {
    pub min: usize,
    pub max: usize,
    pub overflow: OverflowMode,
}

impl Default for CardCountPolicy {
    fn default() -> Self {
        Self {
            min: 3,
            max: 5,
            overflow: OverflowMode::Reject,
        }
    }
}

impl CardCountPolicy {
    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min == 0 {
            return Err("cards.min must be at least 1".to_string());
        }
        if self.min > self.max {
            return Err(format!(
                "cards.min ({}) cannot exceed cards.max ({})",
                self.min, self.max
            ));
        }
        Ok(())
    }

    /// Enforce the bounds on a freshly parsed deck
    pub fn apply(&self, mut cards: Vec<Flashcard>, raw: &str) -> Result<Vec<Flashcard>, StageError> {
        let count = cards.len();
        if count < self.min {
            return Err(StageError::parse(
                format!(
                    "expected between {} and {} flashcards, got {}",
                    self.min, self.max, count
                ),
                raw,
            ));
        }
        if count > self.max {
            match self.overflow {
                OverflowMode::Reject => {
                    return Err(StageError::parse(
                        format!(
                            "expected between {} and {} flashcards, got {}",
                            self.min, self.max, count
                        ),
                        raw,
                    ));
                }
                OverflowMode::Truncate => {
                    warn!(
                        received = count,
                        kept = self.max,
                        "Model returned more flashcards than allowed, truncating deck"
                    );
                    cards.truncate(self.max);
                }
            }
        }
        Ok(cards)
    }
}
