//! Question records and views.

use super::RecordId;
use super::category::UNCLASSIFIED;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A question asked by a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Store-assigned id; `None` until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// The question text.
    pub content: String,
    /// Assigned category. `None` means not yet classified.
    ///
    /// Serialized as `null` rather than omitted so `{"eq": null}` and
    /// `{"ne": null}` predicates see the field.
    #[serde(default)]
    pub category: Option<String>,
    /// Internal id of the student who asked. A reference, not ownership.
    pub student_id: RecordId,
    /// Creation timestamp. Absent on records written without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Question {
    /// Creates a new, unclassified question.
    #[must_use]
    pub fn new(student_id: RecordId, content: impl Into<String>) -> Self {
        Self {
            id: None,
            content: content.into(),
            category: None,
            student_id,
            created_at: Some(Utc::now()),
        }
    }

    /// Returns true once a classification (including the sentinel) was stored.
    #[must_use]
    pub const fn is_classified(&self) -> bool {
        self.category.is_some()
    }

    /// Returns true if the last classification attempt produced the sentinel.
    #[must_use]
    pub fn is_unclassified_sentinel(&self) -> bool {
        self.category.as_deref() == Some(UNCLASSIFIED)
    }
}

/// A question joined with the student who asked it, for teacher views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    /// Question id.
    pub id: RecordId,
    /// Question text.
    pub content: String,
    /// Assigned category, if any.
    pub category: Option<String>,
    /// External identifier of the asking student.
    pub student_id: String,
    /// Display name of the asking student.
    pub student_name: String,
}
