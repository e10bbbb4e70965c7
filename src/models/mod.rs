//! Data models for classroom.
//!
//! Students and questions are stored as generic [`Record`]s; these types are
//! their structured views.

mod category;
mod classification;
mod question;
pub mod record;
mod student;

pub use category::{Category, UNCLASSIFIED, is_assignable_category};
pub use classification::{ClassificationResult, clamp_confidence};
pub use question::{Question, QuestionView};
pub use record::{ID_FIELD, QUESTIONS, Record, RecordId, STUDENTS};
pub use student::Student;
