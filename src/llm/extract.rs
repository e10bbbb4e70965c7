//! JSON extraction from free-form model output.
//!
//! Models asked for "only JSON" still wrap it in Markdown fences or surround
//! it with prose. Extraction runs as an ordered chain of pure stages:
//!
//! 1. A fenced code block (```` ```json ```` or bare ```` ``` ````), parsed as JSON.
//! 2. Only when no fence is present: the whole trimmed response, parsed as JSON.
//!
//! A fenced block that does not parse is a failure. The whole text cannot be
//! JSON if it contains a fence, so there is nothing to fall back to.

use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;

static FENCED_BLOCK: LazyLock<Option<regex::Regex>> = LazyLock::new(|| {
    regex::Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)\s*```").ok()
});

/// Why no JSON object could be extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// The response was empty or whitespace.
    #[error("empty response")]
    Empty,
    /// A fenced block was present but its body is not valid JSON.
    #[error("fenced block is not valid JSON: {0}")]
    InvalidFencedJson(String),
    /// No fence, and the whole response is not valid JSON.
    #[error("no JSON object in response")]
    NoJson,
    /// Valid JSON, but not an object.
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Returns the body of the first fenced code block, if any.
#[must_use]
pub fn fenced_block(response: &str) -> Option<&str> {
    (*FENCED_BLOCK)
        .as_ref()?
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Stage 1: parses a fenced block. `None` when the response has no fence.
#[must_use]
pub fn parse_fenced(response: &str) -> Option<Result<Value, ExtractionFailure>> {
    fenced_block(response).map(|body| {
        serde_json::from_str(body).map_err(|e| ExtractionFailure::InvalidFencedJson(e.to_string()))
    })
}

/// Stage 2: parses the whole trimmed response.
///
/// # Errors
///
/// Returns [`ExtractionFailure::NoJson`] if the text is not valid JSON.
pub fn parse_whole(response: &str) -> Result<Value, ExtractionFailure> {
    serde_json::from_str(response.trim()).map_err(|_| ExtractionFailure::NoJson)
}

/// Runs the extraction chain and requires a JSON object.
///
/// # Errors
///
/// Returns an [`ExtractionFailure`] describing the first stage that
/// rejected the response.
pub fn extract_json_object(response: &str) -> Result<Map<String, Value>, ExtractionFailure> {
    if response.trim().is_empty() {
        return Err(ExtractionFailure::Empty);
    }

    let value = parse_fenced(response).unwrap_or_else(|| parse_whole(response))?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ExtractionFailure::NotAnObject(json_kind(&other))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fenced_json_block() {
        let response = "Sure!\n```json\n{\"category\": \"知识点定义类\"}\n```\nDone.";
        assert_eq!(fenced_block(response), Some("{\"category\": \"知识点定义类\"}"));
        let map = extract_json_object(response).unwrap();
        assert_eq!(map["category"], json!("知识点定义类"));
    }

    #[test]
    fn test_bare_fence() {
        let response = "```\n{\"a\": 1}\n```";
        assert_eq!(extract_json_object(response).unwrap()["a"], json!(1));
    }

    #[test]
    fn test_first_fence_wins() {
        let response = "```json\n{\"a\": 1}\n```\n```json\n{\"a\": 2}\n```";
        assert_eq!(extract_json_object(response).unwrap()["a"], json!(1));
    }

    #[test]
    fn test_whole_text() {
        let response = "  {\"confidence\": 0.5}  \n";
        assert_eq!(parse_fenced(response), None);
        assert_eq!(
            extract_json_object(response).unwrap()["confidence"],
            json!(0.5)
        );
    }

    #[test]
    fn test_malformed_fence_does_not_fall_back() {
        let response = "```json\n{\"a\": }\n```";
        assert!(matches!(
            extract_json_object(response),
            Err(ExtractionFailure::InvalidFencedJson(_))
        ));
    }

    #[test]
    fn test_prose_is_rejected() {
        assert_eq!(
            extract_json_object("I cannot classify this."),
            Err(ExtractionFailure::NoJson)
        );
        assert_eq!(extract_json_object("   "), Err(ExtractionFailure::Empty));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert_eq!(
            extract_json_object("[1, 2]"),
            Err(ExtractionFailure::NotAnObject("an array"))
        );
    }
}
