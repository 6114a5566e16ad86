//! Response payloads built from real workflow runs

use crate::integration::test_utils::{cards_json, QueueGenerator};
use autoanki::assembler::{ResultAssembler, WorkflowResponse};
use autoanki::config::WorkflowSettings;
use autoanki::error::ProviderError;
use autoanki::workflow::{CardCountPolicy, Orchestrator};
use std::sync::Arc;

async fn assembled(replies: Vec<Result<String, ProviderError>>) -> serde_json::Value {
    let orchestrator = Orchestrator::new(
        Arc::new(QueueGenerator::new(replies)),
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain the water cycle", "m").await;
    let response = ResultAssembler::new(CardCountPolicy::default()).assemble(state);
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn test_success_payload_shape() {
    let json = assembled(vec![
        Ok("Water evaporates, condenses and falls.".to_string()),
        Ok(cards_json(5)),
    ])
    .await;

    let object = json.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        ["flashcards", "instruction", "mini_lesson", "status", "workflow_info"]
    );
    assert_eq!(json["instruction"], "Explain the water cycle");
    assert_eq!(json["flashcards"][0]["category"], "fact");

    let timestamp = json["workflow_info"]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_error_payload_shape() {
    let json = assembled(vec![
        Ok("Lesson.".to_string()),
        Ok("not json".to_string()),
    ])
    .await;

    let object = json.as_object().unwrap();
    assert_eq!(object.len(), 3);
    assert_eq!(json["status"], "failed");
    assert_eq!(json["instruction"], "Explain the water cycle");
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("invalid flashcard format"));
}

#[tokio::test]
async fn test_payload_round_trips_as_untagged_enum() {
    let json = assembled(vec![Ok("Lesson.".to_string()), Ok(cards_json(3))]).await;
    let response: WorkflowResponse = serde_json::from_value(json).unwrap();
    assert!(response.is_success());
    assert_eq!(response.instruction(), "Explain the water cycle");
}

#[tokio::test]
async fn test_narrower_assembler_policy_rejects_deck() {
    let orchestrator = Orchestrator::new(
        Arc::new(QueueGenerator::new(vec![
            Ok("Lesson.".to_string()),
            Ok(cards_json(5)),
        ])),
        &WorkflowSettings::default(),
    );
    let state = orchestrator.run("Explain the water cycle", "m").await;
    let narrow = CardCountPolicy {
        max: 4,
        ..CardCountPolicy::default()
    };

    match ResultAssembler::new(narrow).assemble(state) {
        WorkflowResponse::Error(err) => assert!(err.error.starts_with("malformed result")),
        other => panic!("expected error payload, got {:?}", other),
    }
}
