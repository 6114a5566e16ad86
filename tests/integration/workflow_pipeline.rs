//! End-to-end workflow runs against scripted generators

use crate::integration::test_utils::{cards_json, QueueGenerator};
use autoanki::assembler::{ResultAssembler, WorkflowResponse};
use autoanki::config::WorkflowSettings;
use autoanki::error::{ProviderError, ProviderErrorKind};
use autoanki::workflow::{
    CardCountPolicy, Orchestrator, OverflowMode, WorkflowState, WorkflowStatus,
};
use std::sync::Arc;

const FRENCH_REVOLUTION_LESSON: &str = "The French Revolution (1789-1799) was a period of \
radical political and societal change in France. It began with the Estates-General of 1789 \
and ended with the formation of the French Consulate in November 1799.";

fn run_with(
    replies: Vec<Result<String, ProviderError>>,
    settings: &WorkflowSettings,
) -> (Arc<QueueGenerator>, Orchestrator) {
    let generator = Arc::new(QueueGenerator::new(replies));
    let orchestrator = Orchestrator::new(generator.clone(), settings);
    (generator, orchestrator)
}

fn assert_failure_encoding(state: &WorkflowState) {
    assert_eq!(state.is_failed(), state.error().is_some());
    assert!(state.check_invariants().is_ok());
}

#[tokio::test]
async fn test_french_revolution_end_to_end() {
    let (generator, orchestrator) = run_with(
        vec![
            Ok(FRENCH_REVOLUTION_LESSON.to_string()),
            Ok(cards_json(4)),
        ],
        &WorkflowSettings::default(),
    );

    let state = orchestrator
        .run("Generate flashcards about the French Revolution", "deepseek-r1:8b")
        .await;

    assert_eq!(state.status(), WorkflowStatus::CardGenerationComplete);
    assert_eq!(state.flashcards().len(), 4);
    assert_eq!(state.mini_lesson(), Some(FRENCH_REVOLUTION_LESSON));
    assert_eq!(state.topic(), Some("the French Revolution"));
    assert_eq!(state.instruction(), "Generate flashcards about the French Revolution");
    assert_eq!(state.model_name(), "deepseek-r1:8b");
    assert!(state.error().is_none());
    assert_failure_encoding(&state);

    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0].contains("the French Revolution"));
    assert!(prompts[1].contains(FRENCH_REVOLUTION_LESSON));

    let response = ResultAssembler::new(CardCountPolicy::default()).assemble(state);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["status"], "card_generation_complete");
    assert_eq!(json["mini_lesson"], FRENCH_REVOLUTION_LESSON);
    assert_eq!(json["flashcards"].as_array().unwrap().len(), 4);
    assert_eq!(json["workflow_info"]["agent"], "card_generator");
}

#[tokio::test]
async fn test_first_call_failure_for_every_provider_kind() {
    let kinds = [
        ProviderErrorKind::Unauthorized,
        ProviderErrorKind::NotFound,
        ProviderErrorKind::RateLimited,
        ProviderErrorKind::Unavailable,
        ProviderErrorKind::MalformedResponse,
    ];
    for kind in kinds {
        let (generator, orchestrator) = run_with(
            vec![Err(ProviderError::new(kind, "queue", "scripted failure"))],
            &WorkflowSettings::default(),
        );
        let state = orchestrator.run("Explain plate tectonics", "m").await;

        assert_eq!(state.status(), WorkflowStatus::Failed);
        assert!(state.mini_lesson().is_none());
        assert!(state.flashcards().is_empty());
        assert!(
            state.error().unwrap().contains(kind.as_str()),
            "error should name {}: {:?}",
            kind,
            state.error()
        );
        assert_eq!(generator.prompts().len(), 1, "card stage must not run");
        assert_failure_encoding(&state);
    }
}

#[tokio::test]
async fn test_garbage_second_call_keeps_lesson() {
    let (_, orchestrator) = run_with(
        vec![
            Ok("Plates float on the mantle.".to_string()),
            Ok("Here are some thoughts, but no JSON at all.".to_string()),
        ],
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain plate tectonics", "m").await;

    assert_eq!(state.status(), WorkflowStatus::Failed);
    assert_eq!(state.mini_lesson(), Some("Plates float on the mantle."));
    assert!(state.flashcards().is_empty());
    assert!(state.error().unwrap().contains("invalid flashcard format"));
    assert_eq!(
        state.raw_response(),
        Some("Here are some thoughts, but no JSON at all.")
    );
    assert_failure_encoding(&state);
}

#[tokio::test]
async fn test_string_array_is_not_coerced() {
    let (_, orchestrator) = run_with(
        vec![
            Ok("Lesson text.".to_string()),
            Ok(r#"["fact1","fact2"]"#.to_string()),
        ],
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain anything", "m").await;

    assert!(state.is_failed());
    assert!(state.error().unwrap().contains("invalid flashcard format"));
    assert!(state.flashcards().is_empty());
    assert_failure_encoding(&state);
}

#[tokio::test]
async fn test_fenced_json_is_recovered() {
    let fenced = format!("Sure, here you go:\n```json\n{}\n```", cards_json(3));
    let (_, orchestrator) = run_with(
        vec![Ok("Lesson text.".to_string()), Ok(fenced)],
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain anything", "m").await;

    assert_eq!(state.status(), WorkflowStatus::CardGenerationComplete);
    assert_eq!(state.flashcards().len(), 3);
}

#[tokio::test]
async fn test_card_count_policy_modes() {
    let (_, strict) = run_with(
        vec![Ok("Lesson.".to_string()), Ok(cards_json(7))],
        &WorkflowSettings::default(),
    );
    let state = strict.run("Explain anything", "m").await;
    assert!(state.is_failed());
    assert!(state.error().unwrap().contains("got 7"));

    let truncating = WorkflowSettings {
        cards: CardCountPolicy {
            overflow: OverflowMode::Truncate,
            ..CardCountPolicy::default()
        },
        ..WorkflowSettings::default()
    };
    let (_, orchestrator) = run_with(
        vec![Ok("Lesson.".to_string()), Ok(cards_json(7))],
        &truncating,
    );
    let state = orchestrator.run("Explain anything", "m").await;
    assert_eq!(state.status(), WorkflowStatus::CardGenerationComplete);
    assert_eq!(state.flashcards().len(), 5);
    assert_eq!(state.flashcards()[0].question, "Question 1?");

    let (_, too_few) = run_with(
        vec![Ok("Lesson.".to_string()), Ok(cards_json(2))],
        &truncating,
    );
    let state = too_few.run("Explain anything", "m").await;
    assert!(state.is_failed());
}

#[tokio::test]
async fn test_assembler_maps_failure_to_error_payload() {
    let (_, orchestrator) = run_with(
        vec![Err(ProviderError::new(
            ProviderErrorKind::RateLimited,
            "queue",
            "slow down",
        ))],
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain anything", "m").await;
    let response = ResultAssembler::new(CardCountPolicy::default()).assemble(state);

    match response {
        WorkflowResponse::Error(err) => {
            assert_eq!(err.status, WorkflowStatus::Failed);
            assert_eq!(err.instruction, "Explain anything");
            assert!(err.error.contains("rate_limited"));
        }
        other => panic!("expected an error payload, got {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_instruction_fails_without_generation() {
    let (generator, orchestrator) = run_with(vec![], &WorkflowSettings::default());
    let state = orchestrator.run("   ", "m").await;

    assert!(state.is_failed());
    assert_eq!(state.error(), Some("missing instruction"));
    assert!(generator.prompts().is_empty());
    assert_failure_encoding(&state);
}
