//! Chat-completion client for OpenAI-compatible and Anthropic endpoints

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, trace};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_PREFIX: &str = "anthropic/";
const OPENAI_PREFIX: &str = "openai/";

#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or protocol failure while talking to the provider.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The provider answered with a non-success status code.
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    /// The response body did not have the provider's documented shape.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    /// No API key is configured for the provider the model belongs to.
    #[error("no API key configured for {0}")]
    MissingApiKey(Provider),
    /// The completion came back without any text.
    #[error("completion contained no text")]
    EmptyCompletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Anthropic,
}

impl Provider {
    /// Pick the provider for a model id and strip the routing prefix.
    ///
    /// `anthropic/claude-3-5-sonnet-latest` and bare `claude-*` ids go to
    /// Anthropic; everything else is sent to the OpenAI-compatible endpoint.
    pub fn route(model: &str) -> (Self, &str) {
        if let Some(model_id) = model.strip_prefix(ANTHROPIC_PREFIX) {
            return (Self::Anthropic, model_id);
        }
        if model.starts_with("claude-") {
            return (Self::Anthropic, model);
        }
        (Self::OpenAi, model.strip_prefix(OPENAI_PREFIX).unwrap_or(model))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// A single-turn completion: one system prompt, one user message.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// Language-model client returning the raw text of the first completion.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: Client,
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    /// Base URLs stored without a trailing slash.
    openai_base_url: String,
    anthropic_base_url: String,
}

impl LlmClient {
    pub fn builder() -> LlmClientBuilder {
        LlmClientBuilder::default()
    }

    /// Run a completion and return its text, trimmed.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let (provider, model_id) = Provider::route(&request.model);
        debug!(target: "llm", %provider, model_id, max_tokens = request.max_tokens, "requesting completion");

        let text = match provider {
            Provider::OpenAi => self.complete_openai(model_id, request).await?,
            Provider::Anthropic => self.complete_anthropic(model_id, request).await?,
        };

        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        trace!(target: "llm", completion = text, "completion received");
        Ok(text.to_string())
    }

    async fn complete_openai(&self, model_id: &str, request: &ChatRequest) -> Result<String, LlmError> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(Provider::OpenAi))?;

        let body = json!({
            "model": model_id,
            "messages": [
                {"role": "system", "content": request.system},
                {"role": "user", "content": request.user},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.openai_base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;
        let body = read_success_body(response).await?;

        let parsed: OpenAiResponse = serde_json::from_str(&body)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(LlmError::EmptyCompletion)
    }

    async fn complete_anthropic(
        &self,
        model_id: &str,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        let api_key = self
            .anthropic_api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey(Provider::Anthropic))?;

        let body = json!({
            "model": model_id,
            "system": request.system,
            "messages": [
                {"role": "user", "content": request.user},
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.anthropic_base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let body = read_success_body(response).await?;

        let parsed: AnthropicResponse = serde_json::from_str(&body)?;
        let text: String = parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            Err(LlmError::EmptyCompletion)
        } else {
            Ok(text)
        }
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, LlmError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(LlmError::HttpStatus { status, body });
    }
    Ok(body)
}

#[derive(Debug)]
pub struct LlmClientBuilder {
    openai_api_key: Option<String>,
    anthropic_api_key: Option<String>,
    openai_base_url: String,
    anthropic_base_url: String,
    timeout: Duration,
}

impl Default for LlmClientBuilder {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            openai_base_url: OPENAI_BASE_URL.to_string(),
            anthropic_base_url: ANTHROPIC_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl LlmClientBuilder {
    pub fn openai_api_key(mut self, key: Option<String>) -> Self {
        self.openai_api_key = key.filter(|key| !key.is_empty());
        self
    }

    pub fn anthropic_api_key(mut self, key: Option<String>) -> Self {
        self.anthropic_api_key = key.filter(|key| !key.is_empty());
        self
    }

    pub fn openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into();
        self
    }

    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<LlmClient, LlmError> {
        let client = Client::builder()
            .user_agent(concat!("plexmuse/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;

        Ok(LlmClient {
            client,
            openai_api_key: self.openai_api_key,
            anthropic_api_key: self.anthropic_api_key,
            openai_base_url: self.openai_base_url.trim_end_matches('/').to_string(),
            anthropic_base_url: self.anthropic_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_strips_provider_prefixes() {
        assert_eq!(
            Provider::route("anthropic/claude-3-5-sonnet-latest"),
            (Provider::Anthropic, "claude-3-5-sonnet-latest")
        );
        assert_eq!(
            Provider::route("claude-3-haiku-20240307"),
            (Provider::Anthropic, "claude-3-haiku-20240307")
        );
        assert_eq!(Provider::route("openai/gpt-4o"), (Provider::OpenAi, "gpt-4o"));
        assert_eq!(Provider::route("gpt-4"), (Provider::OpenAi, "gpt-4"));
    }

    #[test]
    fn empty_keys_are_treated_as_missing() {
        let builder = LlmClient::builder().openai_api_key(Some(String::new()));
        assert!(builder.openai_api_key.is_none());
    }
}
