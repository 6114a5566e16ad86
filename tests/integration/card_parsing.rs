//! Flashcard parsing against realistic model output

use crate::integration::test_utils::cards_json;
use autoanki::agent::{extract_first_json_array, parse_flashcards};
use autoanki::error::StageError;
use autoanki::workflow::CardCategory;

#[test]
fn test_clean_array_is_not_marked_recovered() {
    let deck = parse_flashcards(&cards_json(3)).unwrap();
    assert_eq!(deck.cards.len(), 3);
    assert!(!deck.recovered);
    assert_eq!(deck.cards[0].category, CardCategory::Fact);
    assert_eq!(deck.cards[1].category, CardCategory::Concept);
}

#[test]
fn test_prose_and_fence_around_array() {
    let raw = format!(
        "<think>The user wants [three] cards.</think>\nHere they are:\n```json\n{}\n```\nEnjoy!",
        cards_json(3)
    );
    let deck = parse_flashcards(&raw).unwrap();
    assert!(deck.recovered);
    assert_eq!(deck.cards.len(), 3);
    assert_eq!(deck.cards[2].question, "Question 3?");
}

#[test]
fn test_brackets_inside_strings() {
    let raw = r#"Cards: [
        {"question": "What does ] close in JSON?", "answer": "An array [like this]", "category": "fact"},
        {"question": "Escaped \" quote [", "answer": "ok", "category": "definition"},
        {"question": "Q3", "answer": "A3", "category": "mnemonic"}
    ] trailing"#;
    let deck = parse_flashcards(raw).unwrap();
    assert_eq!(deck.cards.len(), 3);
    assert_eq!(deck.cards[0].answer, "An array [like this]");
    assert_eq!(
        deck.cards[2].category,
        CardCategory::Other("mnemonic".to_string())
    );
}

#[test]
fn test_rejected_shapes() {
    let cases = [
        r#"{"question": "Q", "answer": "A", "category": "fact"}"#,
        r#"["fact1", "fact2"]"#,
        r#"[{"question": "Q", "answer": "A"}]"#,
        r#"[{"question": "Q", "answer": "A", "category": "fact", "hint": "h"}]"#,
        r#"[{"question": "  ", "answer": "A", "category": "fact"}]"#,
        "I could not come up with any flashcards.",
        "",
    ];
    for raw in cases {
        match parse_flashcards(raw) {
            Err(StageError::Parse { .. }) => {}
            other => panic!("expected parse error for {:?}, got {:?}", raw, other),
        }
    }
}

#[test]
fn test_parse_error_keeps_raw_output() {
    let raw = "no cards here, sorry";
    let err = parse_flashcards(raw).unwrap_err();
    assert_eq!(err.raw_response(), Some(raw));
    assert!(err.to_string().starts_with("invalid flashcard format"));
}

#[test]
fn test_extract_skips_unbalanced_and_non_json_candidates() {
    let text = "see [1] and [not json] then [{\"a\": 1}] and ]][[";
    let value = extract_first_json_array(text).unwrap();
    assert_eq!(value, serde_json::json!([1]));

    assert!(extract_first_json_array("[[[[").is_none());
    assert!(extract_first_json_array("no brackets").is_none());
}
