//! `OpenAI`-compatible chat completions client.

use super::{LlmHttpConfig, LlmProvider, build_http_client};
use crate::config::{LlmConfig, LlmProvider as Provider};
use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Response token limit.
const MAX_TOKENS: u32 = 1024;

/// Client for SiliconFlow, `OpenAI`, or any endpoint speaking the same API.
pub struct OpenAiClient {
    /// Which provider this client talks to.
    provider: Provider,
    /// API key.
    api_key: Option<SecretString>,
    /// API base URL, without `/chat/completions`.
    endpoint: String,
    /// Model to use.
    model: String,
    /// Sampling temperature.
    temperature: f32,
    /// HTTP client.
    client: reqwest::blocking::Client,
}

impl OpenAiClient {
    /// Creates a client with the default provider settings and no API key.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(&LlmConfig::default())
    }

    /// Creates a client from LLM configuration.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            provider: config.provider,
            api_key: config.api_key.clone(),
            endpoint: config.base_url_or_default().trim_end_matches('/').to_string(),
            model: config.model_or_default().to_string(),
            temperature: config.temperature,
            client: build_http_client(LlmHttpConfig::from_config(config)),
        }
    }

    /// Sets the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Replaces the HTTP client with one using the given timeouts.
    #[must_use]
    pub fn with_http_config(mut self, config: LlmHttpConfig) -> Self {
        self.client = build_http_client(config);
        self
    }

    /// Returns the model name.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Validates that the client is configured.
    fn validate(&self) -> Result<()> {
        if self
            .api_key
            .as_ref()
            .is_none_or(|key| key.expose_secret().is_empty())
        {
            return Err(Error::operation(
                "llm_request",
                format!("no API key configured for provider '{}'", self.provider),
            ));
        }
        Ok(())
    }

    fn build_request(&self, prompt: &str) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: self.temperature,
        }
    }

    /// Makes a request to the chat completions API.
    fn request(&self, prompt: &str) -> Result<String> {
        self.validate()?;
        let api_key = self
            .api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .unwrap_or_default();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(api_key)
            .json(&self.build_request(prompt))
            .send()
            .map_err(|e| Error::operation("llm_request", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(Error::operation(
                "llm_request",
                format!("API returned status: {status} - {body}"),
            ));
        }

        let response: ChatCompletionResponse = response
            .json()
            .map_err(|e| Error::operation("llm_response", e))?;
        first_choice(response)
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        self.provider.as_str()
    }

    fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            provider = self.provider.as_str(),
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );
        self.request(prompt)
    }
}

fn first_choice(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| Error::operation("llm_response", "No choices in response"))
}

/// Request to the Chat Completions API.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// A message in the chat.
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Response from the Chat Completions API.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
