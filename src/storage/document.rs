//! Embedded document store adapter.
//!
//! Keeps every collection in a single JSON file using the layout of an
//! embedded document database:
//!
//! ```json
//! {"students": {"1": {"student_id": "stu1", "name": "Ada"}}, "questions": {}}
//! ```
//!
//! The file is loaded on `connect()` and rewritten after every mutation
//! (write to a temporary sibling, then rename). Ids continue from the highest
//! id present in the file.

use super::collections::CollectionSet;
use super::traits::StorageAdapter;
use crate::models::{Record, RecordId};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Maximum accepted database file size (64MB).
const MAX_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// JSON-file document store adapter.
#[derive(Debug)]
pub struct DocumentStoreAdapter {
    /// Path of the database file.
    path: PathBuf,
    /// Loaded collections; `None` while disconnected.
    state: Mutex<Option<CollectionSet>>,
}

impl DocumentStoreAdapter {
    /// Default database file, relative to the working directory.
    pub const DEFAULT_PATH: &'static str = "data/db.json";

    /// Creates an adapter for `path`. Performs no I/O.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    /// Returns the database file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, Option<CollectionSet>>> {
        self.state
            .lock()
            .map_err(|e| Error::operation("lock_document_store", e))
    }

    fn not_connected(&self) -> Error {
        Error::NotConnected {
            backend: self.name().to_string(),
        }
    }

    /// Runs a read-only closure against the loaded collections.
    fn with_data<T>(&self, f: impl FnOnce(&CollectionSet) -> Result<T>) -> Result<T> {
        let state = self.lock_state()?;
        let data = state.as_ref().ok_or_else(|| self.not_connected())?;
        f(data)
    }

    /// Runs a mutating closure against a staged copy of the collections.
    ///
    /// The copy replaces the loaded state only once it is on disk, so a failed
    /// write leaves the store unchanged.
    fn with_data_mut<T>(&self, f: impl FnOnce(&mut CollectionSet) -> Result<T>) -> Result<T> {
        let mut state = self.lock_state()?;
        let data = state.as_mut().ok_or_else(|| self.not_connected())?;
        let mut staged = data.clone();
        let value = f(&mut staged)?;
        self.persist(&staged)?;
        *data = staged;
        Ok(value)
    }

    fn load(&self) -> Result<CollectionSet> {
        if !self.path.exists() {
            return Ok(CollectionSet::default());
        }

        let size = fs::metadata(&self.path)
            .map_err(|e| Error::operation("stat_db_file", e))?
            .len();
        if size > MAX_FILE_SIZE {
            return Err(Error::operation(
                "read_db_file",
                format!(
                    "{} is {size} bytes, exceeding the {MAX_FILE_SIZE} byte limit",
                    self.path.display()
                ),
            ));
        }

        let contents =
            fs::read_to_string(&self.path).map_err(|e| Error::operation("read_db_file", e))?;
        if contents.trim().is_empty() {
            return Ok(CollectionSet::default());
        }

        serde_json::from_str(&contents).map_err(|e| {
            Error::operation("parse_db_file", format!("{}: {e}", self.path.display()))
        })
    }

    fn persist(&self, data: &CollectionSet) -> Result<()> {
        let bytes = serde_json::to_vec(data).map_err(|e| Error::operation("serialize_db", e))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, bytes).map_err(|e| Error::operation("write_db_file", e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| Error::operation("replace_db_file", e))
    }
}

impl Default for DocumentStoreAdapter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATH)
    }
}

impl StorageAdapter for DocumentStoreAdapter {
    fn name(&self) -> &'static str {
        "document"
    }

    fn connect(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if state.is_some() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::operation("create_db_dir", e))?;
        }

        let data = self.load()?;
        if !self.path.exists() {
            self.persist(&data)?;
        }
        tracing::debug!(path = %self.path.display(), "Opened document store");
        *state = Some(data);
        Ok(())
    }

    fn disconnect(&self) -> Result<()> {
        let mut state = self.lock_state()?;
        if let Some(data) = state.take() {
            self.persist(&data)?;
            tracing::debug!(path = %self.path.display(), "Closed document store");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.lock_state().is_ok_and(|state| state.is_some())
    }

    fn create(&self, collection: &str, record: Record) -> Result<Record> {
        self.with_data_mut(|data| data.insert(collection, record))
    }

    fn read(&self, collection: &str, id: RecordId) -> Result<Record> {
        self.with_data(|data| data.get(collection, id))
    }

    fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        self.with_data(|data| Ok(data.all(collection)))
    }

    fn update(&self, collection: &str, id: RecordId, partial: Record) -> Result<Record> {
        self.with_data_mut(|data| data.update(collection, id, partial))
    }

    fn delete(&self, collection: &str, id: RecordId) -> Result<()> {
        self.with_data_mut(|data| data.remove(collection, id))
    }
}
