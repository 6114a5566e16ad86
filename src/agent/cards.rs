//! Flashcard parsing from model output.
//!
//! Output that is valid JSON on its own is judged by its shape alone. Otherwise
//! a single recovery pass looks for the first balanced `[...]` span that parses
//! as a JSON array (models like to wrap JSON in prose or code fences). The
//! recovered value goes through the same strict shape check.

use crate::error::StageError;
use crate::workflow::Flashcard;
use serde::Deserialize;
use serde_json::Value;

/// Bracket positions tried during recovery
const MAX_RECOVERY_CANDIDATES: usize = 32;
const SNIPPET_CHARS: usize = 80;

/// Exactly the three card fields, nothing else
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCard {
    question: String,
    answer: String,
    category: String,
}

/// Successfully parsed cards
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDeck {
    pub cards: Vec<Flashcard>,
    /// Array was cut out of surrounding text
    pub recovered: bool,
}

/// Parse model output into flashcards
pub fn parse_flashcards(raw: &str) -> Result<ParsedDeck, StageError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(StageError::parse("model returned no output", raw));
    }

    let (value, recovered) = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => (value, false),
        Err(_) => match extract_first_json_array(trimmed) {
            Some(value) => (value, true),
            None => {
                return Err(StageError::parse(
                    format!(
                        "no JSON array found in model output (starts with {:?})",
                        snippet(trimmed)
                    ),
                    raw,
                ))
            }
        },
    };

    let cards = cards_from_value(value).map_err(|reason| StageError::parse(reason, raw))?;
    Ok(ParsedDeck { cards, recovered })
}

/// First balanced `[...]` substring that parses as a JSON array
pub fn extract_first_json_array(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '[')
        .take(MAX_RECOVERY_CANDIDATES)
        .filter_map(|(start, _)| balanced_span_end(text, start).map(|end| &text[start..end]))
        .find_map(|span| match serde_json::from_str::<Value>(span) {
            Ok(value @ Value::Array(_)) => Some(value),
            _ => None,
        })
}

/// Byte offset one past the `]` closing the bracket at `start`, skipping
/// brackets inside JSON strings
fn balanced_span_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn cards_from_value(value: Value) -> Result<Vec<Flashcard>, String> {
    let Value::Array(items) = value else {
        return Err(format!(
            "expected a JSON array of flashcard objects, got {}",
            json_type(&value)
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let position = index + 1;
            if !item.is_object() {
                return Err(format!(
                    "card {} is a {}, expected an object with question, answer and category",
                    position,
                    json_type(&item)
                ));
            }
            let card: RawCard =
                serde_json::from_value(item).map_err(|e| format!("card {}: {}", position, e))?;
            for (field, text) in [
                ("question", &card.question),
                ("answer", &card.answer),
                ("category", &card.category),
            ] {
                if text.trim().is_empty() {
                    return Err(format!("card {} has an empty {}", position, field));
                }
            }
            Ok(Flashcard::new(
                card.question.trim(),
                card.answer.trim(),
                card.category.as_str(),
            ))
        })
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn snippet(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
