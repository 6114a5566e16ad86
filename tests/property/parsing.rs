//! Property-based tests for topic extraction and array recovery

use autoanki::agent::{extract_first_json_array, extract_topic, parse_flashcards};
use proptest::prelude::*;

/// Topic extraction never yields an empty topic for a non-blank instruction
#[test]
fn test_topic_never_empty_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&any::<String>(), |instruction| {
            prop_assume!(!instruction.trim().is_empty());
            let topic = extract_topic(&instruction);
            prop_assert!(!topic.trim().is_empty());
            Ok(())
        })
        .unwrap();
}

/// Recovery never panics on arbitrary text, and whatever it finds is an array
#[test]
fn test_extract_array_total_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&"[\\[\\]{}\",:a-z0-9 \\\\]{0,64}", |text| {
            if let Some(value) = extract_first_json_array(&text) {
                prop_assert!(value.is_array());
            }
            let _ = parse_flashcards(&text);
            Ok(())
        })
        .unwrap();
}

/// A valid deck survives arbitrary surrounding prose without brackets
#[test]
fn test_deck_recovered_from_prose_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let deck = r#"[{"question":"Q?","answer":"A","category":"fact"}]"#;

    runner
        .run(&("[a-zA-Z .,!]{0,40}", "[a-zA-Z .,!]{0,40}"), |(before, after)| {
            let raw = format!("{}{}{}", before, deck, after);
            let parsed = parse_flashcards(&raw).unwrap();
            prop_assert_eq!(parsed.cards.len(), 1);
            prop_assert_eq!(parsed.cards[0].question.as_str(), "Q?");
            Ok(())
        })
        .unwrap();
}
