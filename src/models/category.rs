//! Pedagogical category taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel category for questions the model could not classify.
///
/// Not a member of the taxonomy: it marks a failed or low-confidence
/// classification and always carries confidence `0.0`.
pub const UNCLASSIFIED: &str = "Unclassified";

/// The six question categories, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Asks what a concept is.
    #[serde(rename = "知识点定义类")]
    Definition,
    /// Asks how to apply a concept to a problem.
    #[serde(rename = "知识点应用类")]
    Application,
    /// Asks how concepts relate to each other.
    #[serde(rename = "知识点关联类")]
    Relation,
    /// Asks why a concept works the way it does.
    #[serde(rename = "知识点理解类")]
    Understanding,
    /// Reaches beyond the taught material.
    #[serde(rename = "知识点拓展类")]
    Extension,
    /// Points out or asks about a mistake.
    #[serde(rename = "知识点纠错类")]
    Correction,
}

impl Category {
    /// Returns all categories in taxonomy order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Definition,
            Self::Application,
            Self::Relation,
            Self::Understanding,
            Self::Extension,
            Self::Correction,
        ]
    }

    /// Returns the label used in prompts and persisted records.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "知识点定义类",
            Self::Application => "知识点应用类",
            Self::Relation => "知识点关联类",
            Self::Understanding => "知识点理解类",
            Self::Extension => "知识点拓展类",
            Self::Correction => "知识点纠错类",
        }
    }

    /// Parses a category label, ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let label = s.trim();
        Self::all().iter().copied().find(|c| c.as_str() == label)
    }

    /// Returns the taxonomy labels joined for inclusion in a prompt.
    #[must_use]
    pub fn joined_labels(separator: &str) -> String {
        Self::all()
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true if `label` may be stored in a question's `category` field.
#[must_use]
pub fn is_assignable_category(label: &str) -> bool {
    label == UNCLASSIFIED || Category::parse(label).is_some()
}
