//! # Classroom
//!
//! Records student questions, classifies each into one of six pedagogical
//! categories with an external language model, and serves that data to
//! student- and teacher-facing views.
//!
//! ## Layers
//!
//! - **Storage**: a uniform collection + id + predicate document contract
//!   ([`StorageAdapter`]) with pluggable backends (embedded JSON document
//!   store, in-memory, `SQLite`), chosen once at startup by
//!   [`StorageAdapterFactory`] and owned by the [`StorageService`] facade.
//! - **Classification**: [`QuestionClassifier`] builds a categorization
//!   prompt, calls an [`LlmProvider`], and extracts a structured
//!   [`ClassificationResult`] from free text. It never fails: unusable model
//!   output degrades to the `Unclassified` sentinel.
//! - **Application**: [`ClassroomService`] wires the two together for
//!   registration, listing, and classify-and-persist flows.
//!
//! ## Example
//!
//! ```rust,ignore
//! use classroom::config::ClassroomConfig;
//! use classroom::{ClassroomService, QuestionClassifier, StorageService};
//!
//! let config = ClassroomConfig::load_default();
//! let storage = StorageService::from_config(&config.storage)?;
//! storage.connect()?;
//!
//! let classifier = QuestionClassifier::new(classroom::llm::OpenAiClient::from_config(&config.llm));
//! let service = ClassroomService::new(&storage, &classifier);
//! service.register_student("stu1", "Ada")?;
//! let question = service.ask_question("stu1", "什么是函数？")?;
//! service.classify_pending()?;
//!
//! storage.disconnect()?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod config;
pub mod llm;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use config::{ClassroomConfig, StorageBackendType};
pub use llm::LlmProvider;
pub use models::{
    Category, ClassificationResult, Question, QuestionView, Record, RecordId, Student,
    UNCLASSIFIED,
};
pub use services::{ClassroomService, QuestionClassifier, StorageService};
pub use storage::{Query, StorageAdapter, StorageAdapterFactory};

/// Error type for classroom operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `NotConnected` | An adapter operation ran before `connect()` |
/// | `NotFound` | `read`/`update`/`delete` referenced a missing id, or a lookup by external id found nothing |
/// | `UnsupportedBackend` | The factory was asked for a backend that is not implemented |
/// | `Validation` | Record/model conversion failed, a predicate map is malformed, or a uniqueness pre-check failed |
/// | `OperationFailed` | File I/O, `SQLite`, HTTP, lock poisoning, or config parsing failed |
///
/// Classification never surfaces an error: see [`QuestionClassifier`].
#[derive(Debug, ThisError)]
pub enum Error {
    /// A storage operation was invoked before the adapter was connected.
    #[error("storage backend '{backend}' is not connected")]
    NotConnected {
        /// Name of the adapter.
        backend: String,
    },

    /// A record does not exist.
    #[error("record '{id}' not found in collection '{collection}'")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The id (or external identifier) that was looked up.
        id: String,
    },

    /// The requested storage backend is not implemented.
    ///
    /// Raised at startup by the adapter factory so misconfiguration surfaces
    /// before the first request.
    #[error("unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    /// Input failed validation.
    ///
    /// Raised when:
    /// - A record cannot be converted into a model (missing or mistyped fields)
    /// - A model does not serialize into a JSON object
    /// - A predicate map uses an unknown operator or shape
    /// - A student identifier already exists
    /// - Question content is blank
    #[error("validation failed: {0}")]
    Validation(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - Document store file I/O or JSON (de)serialization fails
    /// - `SQLite` statements fail
    /// - LLM HTTP requests fail or return an error status
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Builds a [`Error::NotFound`] for a collection and id.
    pub fn not_found(collection: &str, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Builds a [`Error::OperationFailed`] from any displayable cause.
    pub fn operation(operation: &str, cause: impl std::fmt::Display) -> Self {
        Self::OperationFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// Result type alias for classroom operations.
pub type Result<T> = std::result::Result<T, Error>;
