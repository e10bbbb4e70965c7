//! Business logic services.
//!
//! Services orchestrate the storage adapter and the LLM provider and expose
//! high-level operations.

mod classifier;
mod classroom;
mod storage;

pub use classifier::{Degradation, QuestionClassifier, interpret};
pub use classroom::ClassroomService;
pub use storage::StorageService;
