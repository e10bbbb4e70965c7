//! Storage backend configuration.

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Available storage backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackendType {
    /// Embedded JSON document store (single file).
    #[default]
    Document,
    /// Process memory; nothing is persisted.
    Memory,
    /// `SQLite` database file.
    Sqlite,
    /// PostgreSQL server. Selectable, but not implemented.
    PostgreSQL,
}

impl StorageBackendType {
    /// Returns the canonical backend name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
            Self::PostgreSQL => "postgres",
        }
    }

    /// Parses a backend name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "document" | "tinydb" | "json" => Some(Self::Document),
            "memory" | "in-memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            "postgres" | "postgresql" => Some(Self::PostgreSQL),
            _ => None,
        }
    }

    /// Parses a backend name, failing on unknown names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an unknown backend name.
    pub fn parse_strict(s: &str) -> Result<Self> {
        Self::parse(s).ok_or_else(|| Error::Validation(format!("unknown storage backend '{s}'")))
    }
}

impl fmt::Display for StorageBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// PostgreSQL connection parameters.
#[derive(Debug, Clone)]
pub struct PostgresSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// User name.
    pub user: String,
    /// Password.
    pub password: SecretString,
    /// Database name.
    pub database: String,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: SecretString::from("postgres"),
            database: "classroom".to_string(),
        }
    }
}

impl PostgresSettings {
    /// Returns the `postgresql://` connection URL.
    #[must_use]
    pub fn connection_url(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database
        )
    }
}

/// Storage configuration consumed by the adapter factory.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackendType,
    /// Document store file.
    pub document_path: PathBuf,
    /// `SQLite` database file.
    pub sqlite_path: PathBuf,
    /// PostgreSQL parameters.
    pub postgres: PostgresSettings,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendType::default(),
            document_path: PathBuf::from("data/db.json"),
            sqlite_path: PathBuf::from("data/classroom.db"),
            postgres: PostgresSettings::default(),
        }
    }
}

impl StorageConfig {
    /// Creates a configuration for the given backend with default paths.
    #[must_use]
    pub fn with_backend(backend: StorageBackendType) -> Self {
        Self {
            backend,
            ..Self::default()
        }
    }
}

/// `[storage]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileStorage {
    /// Backend name.
    pub backend: Option<String>,
    /// Document store file.
    pub path: Option<String>,
    /// `SQLite` database file.
    pub sqlite_path: Option<String>,
    /// PostgreSQL parameters.
    pub postgres: Option<ConfigFilePostgres>,
}

/// `[storage.postgres]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePostgres {
    /// Server host.
    pub host: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// User name.
    pub user: Option<String>,
    /// Password.
    #[serde(default, deserialize_with = "super::secret_serde::deserialize_optional")]
    pub password: Option<SecretString>,
    /// Database name.
    pub database: Option<String>,
}

impl StorageConfig {
    /// Applies a parsed `[storage]` section.
    pub(crate) fn apply_file(&mut self, file: ConfigFileStorage) -> Result<()> {
        if let Some(backend) = file.backend {
            self.backend = StorageBackendType::parse_strict(&backend)?;
        }
        if let Some(path) = file.path {
            self.document_path = PathBuf::from(path);
        }
        if let Some(path) = file.sqlite_path {
            self.sqlite_path = PathBuf::from(path);
        }
        if let Some(pg) = file.postgres {
            if let Some(v) = pg.host {
                self.postgres.host = v;
            }
            if let Some(v) = pg.port {
                self.postgres.port = v;
            }
            if let Some(v) = pg.user {
                self.postgres.user = v;
            }
            if let Some(v) = pg.password {
                self.postgres.password = v;
            }
            if let Some(v) = pg.database {
                self.postgres.database = v;
            }
        }
        Ok(())
    }
}
