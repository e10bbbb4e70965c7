//! Storage service facade.
//!
//! Owns the single adapter chosen at startup and converts between typed
//! models and generic records.

use crate::config::StorageConfig;
use crate::models::record::strip_id;
use crate::models::{ID_FIELD, Record, RecordId};
use crate::storage::{Query, StorageAdapter, StorageAdapterFactory};
use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Facade over the configured [`StorageAdapter`].
pub struct StorageService {
    adapter: Box<dyn StorageAdapter>,
}

impl StorageService {
    /// Wraps an adapter.
    #[must_use]
    pub fn new(adapter: Box<dyn StorageAdapter>) -> Self {
        Self { adapter }
    }

    /// Builds the service over the configured backend. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBackend`] if the backend is not implemented.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        StorageAdapterFactory::create(config).map(Self::new)
    }

    /// Returns the adapter's backend name.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.adapter.name()
    }

    /// Returns the underlying adapter.
    #[must_use]
    pub fn adapter(&self) -> &dyn StorageAdapter {
        self.adapter.as_ref()
    }

    /// Connects the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing resource cannot be opened.
    pub fn connect(&self) -> Result<()> {
        self.adapter.connect()?;
        tracing::info!(backend = self.backend(), "Storage connected");
        Ok(())
    }

    /// Disconnects the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if pending state cannot be flushed.
    pub fn disconnect(&self) -> Result<()> {
        self.adapter.disconnect()?;
        tracing::info!(backend = self.backend(), "Storage disconnected");
        Ok(())
    }

    /// Returns true if the adapter is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.adapter.is_connected()
    }

    /// Stores a new record. See [`StorageAdapter::create`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn create(&self, collection: &str, record: Record) -> Result<Record> {
        self.adapter.create(collection, record)
    }

    /// Reads one record. See [`StorageAdapter::read`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn read(&self, collection: &str, id: RecordId) -> Result<Record> {
        self.adapter.read(collection, id)
    }

    /// Reads a whole collection. See [`StorageAdapter::read_all`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn read_all(&self, collection: &str) -> Result<Vec<Record>> {
        self.adapter.read_all(collection)
    }

    /// Merges fields into a record. See [`StorageAdapter::update`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn update(&self, collection: &str, id: RecordId, partial: Record) -> Result<Record> {
        self.adapter.update(collection, id, partial)
    }

    /// Removes a record. See [`StorageAdapter::delete`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn delete(&self, collection: &str, id: RecordId) -> Result<()> {
        self.adapter.delete(collection, id)
    }

    /// Runs a predicate query. See [`StorageAdapter::query`].
    ///
    /// # Errors
    ///
    /// Propagates adapter errors.
    pub fn query(&self, collection: &str, query: &Query) -> Result<Vec<Record>> {
        self.adapter.query(collection, query)
    }

    /// Runs a query given as a raw predicate map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for a malformed map, or adapter errors.
    pub fn query_map(&self, collection: &str, predicates: &Value) -> Result<Vec<Record>> {
        self.query(collection, &Query::parse(predicates)?)
    }

    /// Converts a model into a record.
    ///
    /// A `null` id is dropped so the store assigns one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the model does not serialize to a
    /// JSON object.
    pub fn model_to_record<T: Serialize>(model: &T) -> Result<Record> {
        let value = serde_json::to_value(model)
            .map_err(|e| Error::Validation(format!("cannot serialize model: {e}")))?;
        let Value::Object(mut record) = value else {
            return Err(Error::Validation(format!(
                "model must serialize to a JSON object, got {value}"
            )));
        };
        if record.get(ID_FIELD).is_some_and(Value::is_null) {
            strip_id(&mut record);
        }
        Ok(record)
    }

    /// Converts a record into a model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if required fields are missing or
    /// mistyped.
    pub fn record_to_model<T: DeserializeOwned>(record: Record) -> Result<T> {
        serde_json::from_value(Value::Object(record))
            .map_err(|e| Error::Validation(format!("cannot convert record to model: {e}")))
    }

    /// Stores a model and returns it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns conversion or adapter errors.
    pub fn create_model<T: Serialize + DeserializeOwned>(
        &self,
        collection: &str,
        model: &T,
    ) -> Result<T> {
        let created = self.create(collection, Self::model_to_record(model)?)?;
        Self::record_to_model(created)
    }

    /// Reads one record as a model.
    ///
    /// # Errors
    ///
    /// Returns conversion or adapter errors.
    pub fn read_model<T: DeserializeOwned>(&self, collection: &str, id: RecordId) -> Result<T> {
        Self::record_to_model(self.read(collection, id)?)
    }

    /// Reads a whole collection as models.
    ///
    /// # Errors
    ///
    /// Returns conversion or adapter errors.
    pub fn read_all_models<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        self.read_all(collection)?
            .into_iter()
            .map(Self::record_to_model)
            .collect()
    }

    /// Runs a query and converts the matches into models.
    ///
    /// # Errors
    ///
    /// Returns conversion or adapter errors.
    pub fn query_models<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<T>> {
        self.query(collection, query)?
            .into_iter()
            .map(Self::record_to_model)
            .collect()
    }
}
