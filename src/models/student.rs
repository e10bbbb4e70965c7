//! Student records.

use super::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    /// Store-assigned id; `None` until created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// External identifier (roll number). Unique across the store.
    pub student_id: String,
    /// Display name.
    pub name: String,
    /// Creation timestamp. Absent on records written without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Student {
    /// Creates a new, not yet stored student.
    #[must_use]
    pub fn new(student_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            student_id: student_id.into(),
            name: name.into(),
            created_at: Some(Utc::now()),
        }
    }
}
