//! Storage adapter factory.

use super::{DocumentStoreAdapter, MemoryAdapter, SqliteAdapter, StorageAdapter};
use crate::config::{StorageBackendType, StorageConfig};
use crate::{Error, Result};

/// Builds the configured [`StorageAdapter`].
///
/// Called once at startup. The returned adapter is not yet connected.
pub struct StorageAdapterFactory;

impl StorageAdapterFactory {
    /// Creates an adapter for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBackend`] for PostgreSQL, which can be
    /// selected but is not implemented.
    pub fn create(config: &StorageConfig) -> Result<Box<dyn StorageAdapter>> {
        Self::create_with_backend(config.backend, config)
    }

    /// Creates an adapter for an explicit backend, taking paths from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedBackend`] for PostgreSQL.
    pub fn create_with_backend(
        backend: StorageBackendType,
        config: &StorageConfig,
    ) -> Result<Box<dyn StorageAdapter>> {
        let adapter: Box<dyn StorageAdapter> = match backend {
            StorageBackendType::Document => {
                Box::new(DocumentStoreAdapter::new(&config.document_path))
            },
            StorageBackendType::Memory => Box::new(MemoryAdapter::new()),
            StorageBackendType::Sqlite => Box::new(SqliteAdapter::new(&config.sqlite_path)),
            StorageBackendType::PostgreSQL => {
                tracing::error!(
                    host = %config.postgres.host,
                    database = %config.postgres.database,
                    "PostgreSQL storage requested but not implemented"
                );
                return Err(Error::UnsupportedBackend(format!(
                    "{backend} (use document, memory, or sqlite)"
                )));
            },
        };

        tracing::info!(backend = adapter.name(), "Created storage adapter");
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_is_document_store() {
        let adapter = StorageAdapterFactory::create(&StorageConfig::default()).unwrap();
        assert_eq!(adapter.name(), "document");
        assert!(!adapter.is_connected());
    }

    #[test]
    fn test_memory_and_sqlite() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            sqlite_path: dir.path().join("classroom.db"),
            ..StorageConfig::default()
        };

        let memory =
            StorageAdapterFactory::create_with_backend(StorageBackendType::Memory, &config)
                .unwrap();
        assert_eq!(memory.name(), "memory");

        let sqlite =
            StorageAdapterFactory::create_with_backend(StorageBackendType::Sqlite, &config)
                .unwrap();
        assert_eq!(sqlite.name(), "sqlite");
        sqlite.connect().unwrap();
        assert!(dir.path().join("classroom.db").exists());
    }

    #[test]
    fn test_postgres_is_unsupported() {
        let config = StorageConfig::with_backend(StorageBackendType::PostgreSQL);
        let result = StorageAdapterFactory::create(&config);
        assert!(matches!(result, Err(Error::UnsupportedBackend(ref msg)) if msg.contains("postgres")));
    }
}
