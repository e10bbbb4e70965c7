//! LLM provider configuration.

use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;

/// Available LLM providers. Both speak the `OpenAI` chat completions API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// SiliconFlow hosted models.
    #[default]
    SiliconFlow,
    /// `OpenAI` GPT.
    OpenAi,
}

impl LlmProvider {
    /// Parses a provider string. Unknown names fall back to the default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "openai" => Self::OpenAi,
            _ => Self::SiliconFlow,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SiliconFlow => "siliconflow",
            Self::OpenAi => "openai",
        }
    }

    /// Default API base URL.
    #[must_use]
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::SiliconFlow => "https://api.siliconflow.cn/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    /// Default model name.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::SiliconFlow => "deepseek-ai/DeepSeek-V2.5",
            Self::OpenAi => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider.
    pub provider: LlmProvider,
    /// Model name; provider default when `None`.
    pub model: Option<String>,
    /// API key (may be an environment reference like `${OPENAI_API_KEY}`).
    pub api_key: Option<SecretString>,
    /// API base URL; provider default when `None`.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: None,
            api_key: None,
            base_url: None,
            temperature: 0.0,
            timeout_ms: None,
            connect_timeout_ms: None,
        }
    }
}

impl LlmConfig {
    /// Returns the configured model or the provider default.
    #[must_use]
    pub fn model_or_default(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Returns the configured base URL or the provider default.
    #[must_use]
    pub fn base_url_or_default(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

/// `[llm]` section of the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileLlm {
    /// Provider name.
    pub provider: Option<String>,
    /// Model name.
    pub model: Option<String>,
    /// API key.
    #[serde(default, deserialize_with = "super::secret_serde::deserialize_optional")]
    pub api_key: Option<SecretString>,
    /// Base URL.
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl LlmConfig {
    /// Applies a parsed `[llm]` section.
    pub(crate) fn apply_file(&mut self, file: ConfigFileLlm) {
        if let Some(provider) = file.provider {
            self.provider = LlmProvider::parse(&provider);
        }
        if file.model.is_some() {
            self.model = file.model;
        }
        if file.api_key.is_some() {
            self.api_key = file.api_key;
        }
        if file.base_url.is_some() {
            self.base_url = file.base_url;
        }
        if let Some(temperature) = file.temperature {
            self.temperature = temperature;
        }
        if file.timeout_ms.is_some() {
            self.timeout_ms = file.timeout_ms;
        }
        if file.connect_timeout_ms.is_some() {
            self.connect_timeout_ms = file.connect_timeout_ms;
        }
    }
}
