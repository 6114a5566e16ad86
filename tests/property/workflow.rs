//! Property-based tests for workflow outcomes

use async_trait::async_trait;
use autoanki::config::WorkflowSettings;
use autoanki::error::{ProviderError, ProviderErrorKind};
use autoanki::provider::{GenerationOptions, TextGenerator};
use autoanki::workflow::{Orchestrator, WorkflowState, WorkflowStatus};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct Scripted(Mutex<VecDeque<Result<String, ProviderError>>>);

#[async_trait]
impl TextGenerator for Scripted {
    async fn generate(
        &self,
        _prompt: &str,
        _model: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::unavailable("scripted", "exhausted")))
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

fn run(instruction: &str, replies: Vec<Result<String, ProviderError>>) -> WorkflowState {
    let generator = Arc::new(Scripted(Mutex::new(replies.into())));
    let orchestrator = Orchestrator::new(generator, &WorkflowSettings::default());
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(orchestrator.run(instruction, "m"))
}

fn deck(n: usize) -> String {
    let cards: Vec<serde_json::Value> = (0..n)
        .map(|i| serde_json::json!({"question": format!("Q{}", i), "answer": "A", "category": "fact"}))
        .collect();
    serde_json::Value::Array(cards).to_string()
}

fn kind() -> impl Strategy<Value = ProviderErrorKind> {
    prop_oneof![
        Just(ProviderErrorKind::Unauthorized),
        Just(ProviderErrorKind::NotFound),
        Just(ProviderErrorKind::RateLimited),
        Just(ProviderErrorKind::Unavailable),
        Just(ProviderErrorKind::MalformedResponse),
    ]
}

/// Any non-blank instruction with a well-formed deck completes with 3 to 5 cards
#[test]
fn test_valid_deck_completes_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-zA-Z0-9 ,.?]{1,60}", "[a-zA-Z .]{1,80}", 3usize..=5),
            |(instruction, lesson, count)| {
                prop_assume!(!instruction.trim().is_empty() && !lesson.trim().is_empty());
                let state = run(&instruction, vec![Ok(lesson.clone()), Ok(deck(count))]);

                prop_assert_eq!(state.status(), WorkflowStatus::CardGenerationComplete);
                prop_assert_eq!(state.flashcards().len(), count);
                prop_assert_eq!(state.mini_lesson(), Some(lesson.as_str()));
                prop_assert_eq!(state.instruction(), instruction.as_str());
                Ok(())
            },
        )
        .unwrap();
}

/// A failed first call leaves no lesson and no cards
#[test]
fn test_first_call_failure_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&("[a-zA-Z ]{1,40}", kind()), |(instruction, kind)| {
            prop_assume!(!instruction.trim().is_empty());
            let state = run(
                &instruction,
                vec![Err(ProviderError::new(kind, "scripted", "boom"))],
            );

            prop_assert_eq!(state.status(), WorkflowStatus::Failed);
            prop_assert!(state.mini_lesson().is_none());
            prop_assert!(state.flashcards().is_empty());
            Ok(())
        })
        .unwrap();
}

/// Whatever the second reply, the run ends terminal and failed iff it has an error
#[test]
fn test_terminal_failure_encoding_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&".{0,120}", |reply| {
            let state = run("Explain tides", vec![Ok("Tides follow the moon.".to_string()), Ok(reply)]);

            prop_assert!(state.is_terminal());
            prop_assert_eq!(state.is_failed(), state.error().is_some());
            prop_assert!(state.check_invariants().is_ok());
            prop_assert_eq!(state.mini_lesson(), Some("Tides follow the moon."));
            if state.is_failed() {
                prop_assert!(state.flashcards().is_empty());
            } else {
                prop_assert!((3..=5).contains(&state.flashcards().len()));
            }
            Ok(())
        })
        .unwrap();
}
