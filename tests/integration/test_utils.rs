//! Shared test utilities for integration tests
//!
//! Scripted text generators standing in for real backends, canned model
//! output, and serialized access to the environment for config tests.

use async_trait::async_trait;
use autoanki::error::{ProviderError, ProviderErrorKind};
use autoanki::provider::{GenerationOptions, TextGenerator};
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

/// Marker line present only in the card generation prompt
const CARD_PROMPT_MARKER: &str = "Flashcards (JSON format only)";

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Variables a test may touch; all are cleared on entry and restored on exit
const ISOLATED_VARS: &[&str] = &[
    "HOME",
    "XDG_CONFIG_HOME",
    "AUTOANKI_ENV",
    "AUTOANKI__DEFAULT_MODEL",
    "AUTOANKI__BACKEND__KIND",
    "AUTOANKI__BACKEND__API_KEY",
    "AUTOANKI__BACKEND__ENDPOINT",
    "AUTOANKI__WORKFLOW__CARDS__MAX",
];

/// Run `f` with HOME and XDG_CONFIG_HOME pointing into `test_dir`
///
/// XDG_CONFIG_HOME is `<test_dir>/config_home`; HOME is `<test_dir>/home`.
/// The original environment is restored afterwards, even if `f` panics.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    struct Restore(Vec<(&'static str, Option<String>)>);

    impl Drop for Restore {
        fn drop(&mut self) {
            for (name, value) in &self.0 {
                match value {
                    Some(value) => std::env::set_var(name, value),
                    None => std::env::remove_var(name),
                }
            }
        }
    }

    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let _restore = Restore(
        ISOLATED_VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect(),
    );
    for name in ISOLATED_VARS {
        std::env::remove_var(name);
    }

    let config_home = test_dir.path().join("config_home");
    let home = test_dir.path().join("home");
    std::fs::create_dir_all(&config_home).unwrap();
    std::fs::create_dir_all(&home).unwrap();
    std::env::set_var("HOME", &home);
    std::env::set_var("XDG_CONFIG_HOME", &config_home);

    f()
}

/// JSON array of `n` well-formed flashcards
pub fn cards_json(n: usize) -> String {
    let categories = ["fact", "concept", "definition", "example"];
    let cards: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            serde_json::json!({
                "question": format!("Question {}?", i + 1),
                "answer": format!("Answer {}", i + 1),
                "category": categories[i % categories.len()],
            })
        })
        .collect();
    serde_json::Value::Array(cards).to_string()
}

/// Generator replaying a fixed queue of results, one per call
pub struct QueueGenerator {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl QueueGenerator {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for QueueGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _model: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ProviderError::new(
                ProviderErrorKind::Unavailable,
                "queue",
                "no scripted reply left",
            ))
        })
    }

    fn provider_name(&self) -> &str {
        "queue"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["queue-model".to_string()])
    }
}

/// Generator deriving its replies from the prompt, so concurrent runs can be
/// told apart. The lesson names the topic line of the research prompt and
/// every card question quotes the first lesson line.
pub struct EchoGenerator;

impl EchoGenerator {
    pub fn lesson_for(instruction: &str) -> String {
        format!("Lesson for: {}", instruction)
    }
}

#[async_trait]
impl TextGenerator for EchoGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _model: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        // Interleave with other runs
        for _ in 0..(prompt.len() % 5) {
            tokio::task::yield_now().await;
        }

        if prompt.contains(CARD_PROMPT_MARKER) {
            let lesson_line = prompt
                .lines()
                .find(|line| line.starts_with("Lesson for: "))
                .ok_or_else(|| ProviderError::malformed("echo", "no lesson in prompt"))?;
            let cards: Vec<serde_json::Value> = (0..3)
                .map(|i| {
                    serde_json::json!({
                        "question": format!("{} #{}", lesson_line, i),
                        "answer": "echo",
                        "category": "fact",
                    })
                })
                .collect();
            return Ok(serde_json::Value::Array(cards).to_string());
        }

        let instruction = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Topic: "))
            .ok_or_else(|| ProviderError::malformed("echo", "no topic in prompt"))?;
        Ok(Self::lesson_for(instruction))
    }

    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}
