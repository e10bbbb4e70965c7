//! Classifier integration tests.
//!
//! Drives [`QuestionClassifier`] through scripted providers:
//! - Fenced and bare JSON answers
//! - Prose, malformed, and out-of-taxonomy answers degrade to the sentinel
//! - Provider failures (including an unreachable HTTP endpoint) degrade
//! - Batches keep length and order, one bad item does not poison the rest

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use classroom::config::LlmConfig;
use classroom::llm::{LlmHttpConfig, LlmProvider, OpenAiClient};
use classroom::{Category, ClassificationResult, Error, QuestionClassifier, Result, UNCLASSIFIED};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Replies with scripted responses in order, then fails.
struct ScriptedProvider {
    responses: Mutex<std::vec::IntoIter<Result<String>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter()),
            calls: AtomicUsize::new(0),
        }
    }

    fn ok(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok((*r).to_string())).collect())
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .next()
            .unwrap_or_else(|| Err(Error::operation("scripted", "script exhausted")))
    }
}

fn classify_one(response: &str) -> ClassificationResult {
    QuestionClassifier::new(ScriptedProvider::ok(&[response])).classify("什么是函数？")
}

fn assert_sentinel(result: &ClassificationResult) {
    assert_eq!(result.category, UNCLASSIFIED);
    assert!(result.confidence.abs() < f64::EPSILON);
    assert!(!result.explanation.is_empty());
}

// ============================================================================
// Successful extraction
// ============================================================================

#[test]
fn test_fenced_definition_answer() {
    let result = classify_one(
        "```json\n{\"category\":\"知识点定义类\",\"confidence\":0.9,\"explanation\":\"asks what a function is\"}\n```",
    );
    assert_eq!(result.category, "知识点定义类");
    assert!((result.confidence - 0.9).abs() < f64::EPSILON);
    assert_eq!(result.taxonomy_category(), Some(Category::Definition));
}

#[test]
fn test_bare_json_answer() {
    let result = classify_one(
        r#"{"category": "知识点应用类", "confidence": 0.75, "explanation": "applies a formula"}"#,
    );
    assert_eq!(result.category, "知识点应用类");
    assert!((result.confidence - 0.75).abs() < f64::EPSILON);
}

#[test]
fn test_fenced_answer_with_surrounding_prose() {
    let result = classify_one(
        "这是分类结果：\n```json\n{\"category\": \"知识点纠错类\", \"confidence\": 0.8, \"explanation\": \"找错\"}\n```\n希望有帮助。",
    );
    assert_eq!(result.category, "知识点纠错类");
}

#[test]
fn test_every_label_is_accepted() {
    for category in Category::all() {
        let response = format!(
            r#"{{"category": "{}", "confidence": 0.5, "explanation": "x"}}"#,
            category.as_str()
        );
        let result = classify_one(&response);
        assert_eq!(result.taxonomy_category(), Some(*category));
    }
}

// ============================================================================
// Degradation
// ============================================================================

#[test]
fn test_prose_answer_is_unclassified() {
    let result = classify_one("I cannot classify this.");
    assert_sentinel(&result);
}

#[test]
fn test_malformed_fenced_json_is_unclassified() {
    let result = classify_one("```json\n{\"category\": \"知识点定义类\", \n```");
    assert_sentinel(&result);
}

#[test]
fn test_unknown_category_is_unclassified() {
    let result = classify_one(r#"{"category": "数学类", "confidence": 0.9, "explanation": "x"}"#);
    assert_sentinel(&result);
    assert!(result.explanation.contains("数学类"));
}

#[test]
fn test_missing_explanation_is_unclassified() {
    let result = classify_one(r#"{"category": "知识点定义类", "confidence": 0.9}"#);
    assert_sentinel(&result);
    assert!(result.explanation.contains("explanation"));
}

#[test]
fn test_provider_error_is_unclassified() {
    let classifier = QuestionClassifier::new(ScriptedProvider::new(vec![Err(Error::operation(
        "llm_request",
        "API returned status: 401 Unauthorized",
    ))]));
    let result = classifier.classify("q");
    assert_sentinel(&result);
    assert!(result.explanation.contains("model call failed"));
}

#[test]
fn test_openai_client_without_key_is_unclassified() {
    let client = OpenAiClient::from_config(&LlmConfig::default());
    let result = QuestionClassifier::new(client).classify("什么是函数？");
    assert_sentinel(&result);
}

#[test]
fn test_unreachable_endpoint_is_unclassified() {
    let client = OpenAiClient::new()
        .with_api_key("test-key")
        .with_endpoint("http://127.0.0.1:1/v1")
        .with_http_config(LlmHttpConfig {
            timeout_ms: 2_000,
            connect_timeout_ms: 500,
        });
    let result = QuestionClassifier::new(client).classify("什么是函数？");
    assert_sentinel(&result);
    assert!(result.explanation.starts_with("model call failed"));
}

// ============================================================================
// Batches
// ============================================================================

#[test]
fn test_batch_with_malformed_middle_item() {
    let provider = ScriptedProvider::ok(&[
        r#"{"category": "知识点定义类", "confidence": 0.9, "explanation": "a"}"#,
        "```json\n{oops}\n```",
        r#"{"category": "知识点拓展类", "confidence": 0.4, "explanation": "c"}"#,
    ]);
    let classifier = QuestionClassifier::new(provider);

    let results = classifier.classify_batch(&["a", "b", "c"]);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].category, "知识点定义类");
    assert_sentinel(&results[1]);
    assert_eq!(results[2].category, "知识点拓展类");
    assert_eq!(classifier.provider().calls(), 3);
}

#[test]
fn test_batch_survives_provider_failures() {
    let provider = ScriptedProvider::new(vec![
        Err(Error::operation("llm_request", "timeout")),
        Ok(r#"{"category": "知识点关联类", "confidence": 0.6, "explanation": "b"}"#.to_string()),
    ]);
    let classifier = QuestionClassifier::new(provider);

    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let results = classifier.classify_batch(&texts);

    assert_eq!(results.len(), 3);
    assert_sentinel(&results[0]);
    assert_eq!(results[1].category, "知识点关联类");
    assert_sentinel(&results[2]);
}
