//! Configuration management.
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (`--config PATH`, or `<config dir>/classroom/config.toml`)
//! 3. `.env` in the working directory (loaded into the process environment)
//! 4. `CLASSROOM_*` environment variables
//!
//! ```toml
//! [storage]
//! backend = "document"          # document | memory | sqlite | postgres
//! path = "data/db.json"
//!
//! [llm]
//! provider = "siliconflow"      # siliconflow | openai
//! api_key = "${SILICONFLOW_API_KEY}"
//!
//! [logging]
//! format = "json"
//! ```

mod llm;
mod storage;

pub use llm::{ConfigFileLlm, LlmConfig, LlmProvider};
pub use storage::{
    ConfigFilePostgres, ConfigFileStorage, PostgresSettings, StorageBackendType, StorageConfig,
};

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for classroom.
#[derive(Debug, Clone, Default)]
pub struct ClassroomConfig {
    /// Storage backend selection and parameters.
    pub storage: StorageConfig,
    /// LLM provider configuration.
    pub llm: LlmConfig,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging settings from the config file or environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// `tracing` filter directive, e.g. `classroom=debug`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// LLM section.
    pub llm: Option<ConfigFileLlm>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// `[logging]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLogging {
    /// Output format.
    pub format: Option<String>,
    /// Filter directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl ClassroomConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration for the CLI: file (explicit or default location),
    /// then `.env`, then environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file cannot be read or parsed, or an
    /// environment variable holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default(),
        };

        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to load .env file: {e}");
            }
        }

        config.with_env_overrides()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::operation("read_config_file", e))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or names an unknown
    /// storage backend.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| Error::operation("parse_config_file", e))?;
        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Returns default configuration if no config file is found or it cannot
    /// be loaded.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        Self::load_from_file(&path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "Ignoring unreadable config file: {e}");
            Self::default()
        })
    }

    /// Returns `<platform config dir>/classroom/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|d| d.config_dir().join("classroom").join("config.toml"))
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(storage) = file.storage {
            config.storage.apply_file(storage)?;
        }
        if let Some(llm) = file.llm {
            config.llm.apply_file(llm);
        }
        if let Some(logging) = file.logging {
            config.logging.format = logging.format;
            config.logging.filter = logging.filter;
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Applies `CLASSROOM_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable holds an invalid value.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a value cannot be parsed.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let storage = &mut self.storage;
        if let Some(v) = lookup("CLASSROOM_DATABASE_TYPE") {
            storage.backend = StorageBackendType::parse_strict(&v)?;
        }
        if let Some(v) = lookup("CLASSROOM_DB_PATH") {
            storage.document_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLASSROOM_SQLITE_PATH") {
            storage.sqlite_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("CLASSROOM_POSTGRES_SERVER") {
            storage.postgres.host = v;
        }
        if let Some(v) = lookup("CLASSROOM_POSTGRES_PORT") {
            storage.postgres.port = parse_number("CLASSROOM_POSTGRES_PORT", &v)?;
        }
        if let Some(v) = lookup("CLASSROOM_POSTGRES_USER") {
            storage.postgres.user = v;
        }
        if let Some(v) = lookup("CLASSROOM_POSTGRES_PASSWORD") {
            storage.postgres.password = SecretString::from(v);
        }
        if let Some(v) = lookup("CLASSROOM_POSTGRES_DB") {
            storage.postgres.database = v;
        }

        let llm = &mut self.llm;
        if let Some(v) = lookup("CLASSROOM_LLM_PROVIDER") {
            llm.provider = LlmProvider::parse(&v);
        }
        if let Some(v) = lookup("CLASSROOM_LLM_MODEL") {
            llm.model = Some(v);
        }
        if let Some(v) = lookup("CLASSROOM_LLM_BASE_URL") {
            llm.base_url = Some(v);
        }
        if let Some(v) = lookup("CLASSROOM_LLM_API_KEY") {
            llm.api_key = Some(SecretString::from(v));
        }
        if let Some(v) = lookup("CLASSROOM_LLM_TIMEOUT_MS") {
            llm.timeout_ms = Some(parse_number("CLASSROOM_LLM_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("CLASSROOM_LLM_CONNECT_TIMEOUT_MS") {
            llm.connect_timeout_ms = Some(parse_number("CLASSROOM_LLM_CONNECT_TIMEOUT_MS", &v)?);
        }

        // Expand `${VAR}` references, then fall back to the provider's own key.
        llm.api_key = llm
            .api_key
            .take()
            .and_then(|key| expand_env_reference(key.expose_secret(), &lookup))
            .map(SecretString::from);
        if llm.api_key.is_none() && llm.provider == LlmProvider::OpenAi {
            llm.api_key = lookup("OPENAI_API_KEY").map(SecretString::from);
        }

        if let Some(v) = lookup("CLASSROOM_LOG_FORMAT") {
            self.logging.format = Some(v);
        }
        if let Some(v) = lookup("CLASSROOM_LOG") {
            self.logging.filter = Some(v);
        }
        if let Some(v) = lookup("CLASSROOM_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(v));
        }

        Ok(self)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Validation(format!("{key} must be a number, got '{value}'")))
}

/// Resolves a whole-value `${VAR}` reference. Unset references resolve to `None`.
/// Serde helpers that read config-file secrets straight into [`SecretString`].
mod secret_serde {
    use secrecy::SecretString;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize_optional<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
    }
}

fn expand_env_reference(value: &str, lookup: &impl Fn(&str) -> Option<String>) -> Option<String> {
    value
        .strip_prefix("${")
        .and_then(|rest| rest.strip_suffix('}'))
        .map_or_else(|| Some(value.to_string()), lookup)
}
