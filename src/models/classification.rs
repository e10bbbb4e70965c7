//! Classification results.

use super::category::{Category, UNCLASSIFIED};
use serde::{Deserialize, Serialize};

/// Structured judgment produced by the question classifier.
///
/// Transient: only `category` is persisted, onto the question record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// A taxonomy label or [`UNCLASSIFIED`].
    pub category: String,
    /// Confidence in `[0.0, 1.0]`; `0.0` for the sentinel.
    pub confidence: f64,
    /// Human-readable rationale, or a short failure note for the sentinel.
    pub explanation: String,
}

impl ClassificationResult {
    /// Creates a result for a taxonomy category, clamping confidence into range.
    #[must_use]
    pub fn new(category: Category, confidence: f64, explanation: impl Into<String>) -> Self {
        Self {
            category: category.as_str().to_string(),
            confidence: clamp_confidence(confidence),
            explanation: explanation.into(),
        }
    }

    /// Creates the sentinel result.
    #[must_use]
    pub fn unclassified(explanation: impl Into<String>) -> Self {
        Self {
            category: UNCLASSIFIED.to_string(),
            confidence: 0.0,
            explanation: explanation.into(),
        }
    }

    /// Returns true if this is the sentinel result.
    #[must_use]
    pub fn is_unclassified(&self) -> bool {
        self.category == UNCLASSIFIED
    }

    /// Returns the taxonomy category, or `None` for the sentinel.
    #[must_use]
    pub fn taxonomy_category(&self) -> Option<Category> {
        Category::parse(&self.category)
    }
}

/// Clamps a confidence value into `[0.0, 1.0]`. NaN maps to `0.0`.
#[must_use]
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
