//! Question classification.
//!
//! [`QuestionClassifier::classify`] is total: model failures, unparseable
//! output, and answers outside the taxonomy all degrade to the
//! `Unclassified` sentinel with a short diagnostic in `explanation`.

use crate::llm::{ExtractionFailure, LlmProvider, extract_json_object};
use crate::models::{Category, ClassificationResult, UNCLASSIFIED};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::instrument;

/// Why a classification degraded to the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Degradation {
    /// The provider call failed (network, HTTP status, missing key).
    #[error("model call failed: {0}")]
    ModelCall(String),
    /// No JSON object could be extracted from the response.
    #[error(transparent)]
    Extraction(#[from] ExtractionFailure),
    /// A required field is absent or null.
    #[error("missing field: {0}")]
    MissingField(&'static str),
    /// The category is not one of the six labels.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// The confidence is not a finite number.
    #[error("invalid confidence: {0}")]
    InvalidConfidence(String),
}

/// Classifies question text into the six-category taxonomy.
pub struct QuestionClassifier<P: LlmProvider> {
    /// LLM provider for the categorization call.
    llm: P,
}

impl<P: LlmProvider> QuestionClassifier<P> {
    /// Creates a classifier over a provider.
    #[must_use]
    pub const fn new(llm: P) -> Self {
        Self { llm }
    }

    /// Returns the provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.llm
    }

    /// Builds the categorization prompt for a question.
    #[must_use]
    pub fn build_prompt(question: &str) -> String {
        format!(
            "请将以下问题分类到最合适的类别中。类别包括：{labels}\n\
             \n\
             问题：{question}\n\
             \n\
             请以JSON格式返回，包含以下字段：\n\
             - category: 分类名称\n\
             - confidence: 置信度（0-1之间的浮点数）\n\
             - explanation: 分类理由\n\
             \n\
             只返回JSON格式的结果，不要包含其他文字。",
            labels = Category::joined_labels(", "),
        )
    }

    /// Classifies one question. Never fails.
    #[instrument(skip(self, question), fields(provider = self.llm.name(), chars = question.chars().count()))]
    pub fn classify(&self, question: &str) -> ClassificationResult {
        match self.try_classify(question) {
            Ok(result) => {
                tracing::debug!(
                    category = %result.category,
                    confidence = result.confidence,
                    "Classified question"
                );
                result
            },
            Err(degradation) => {
                tracing::warn!("Classification degraded to {UNCLASSIFIED}: {degradation}");
                ClassificationResult::unclassified(degradation.to_string())
            },
        }
    }

    /// Classifies questions one after another.
    ///
    /// The output has the same length and order as the input; a failure on
    /// one item does not affect the others.
    #[instrument(skip_all, fields(provider = self.llm.name(), count = questions.len()))]
    pub fn classify_batch<S: AsRef<str>>(&self, questions: &[S]) -> Vec<ClassificationResult> {
        questions
            .iter()
            .map(|question| self.classify(question.as_ref()))
            .collect()
    }

    fn try_classify(&self, question: &str) -> Result<ClassificationResult, Degradation> {
        let response = self
            .llm
            .complete(&Self::build_prompt(question))
            .map_err(|e| Degradation::ModelCall(e.to_string()))?;
        interpret(&extract_json_object(&response)?)
    }
}

/// Validates an extracted JSON object into a result.
///
/// # Errors
///
/// Returns a [`Degradation`] naming the first field that failed validation.
pub fn interpret(fields: &Map<String, Value>) -> Result<ClassificationResult, Degradation> {
    let category = match present(fields, "category")? {
        Value::String(s) => s.trim().to_string(),
        other => return Err(Degradation::UnknownCategory(other.to_string())),
    };
    let confidence = parse_confidence(present(fields, "confidence")?)?;
    let explanation = match present(fields, "explanation")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if category == UNCLASSIFIED {
        return Ok(ClassificationResult::unclassified(explanation));
    }
    let category = Category::parse(&category).ok_or(Degradation::UnknownCategory(category))?;
    Ok(ClassificationResult::new(category, confidence, explanation))
}

fn present<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, Degradation> {
    fields
        .get(name)
        .filter(|v| !v.is_null())
        .ok_or(Degradation::MissingField(name))
}

fn parse_confidence(value: &Value) -> Result<f64, Degradation> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|c| c.is_finite())
        .ok_or_else(|| Degradation::InvalidConfidence(value.to_string()))
}
