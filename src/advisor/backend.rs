//! Generative-text backends for coaching advice.
//!
//! - Local: Ollama (default)
//! - Remote: Anthropic (feature `remote-ai`)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AdvisorError;
use crate::config::AiConfig;
use crate::riot::{truncate_chars, MAX_ERROR_BODY_CHARS};

/// One coaching prompt: a fixed instruction plus the player's data.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: 0.7,
            max_tokens: 400,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// A model that turns a prompt into text.
#[async_trait]
pub trait AiBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Generate a reply to `request`.
    async fn chat(&self, request: &ChatRequest) -> Result<String, AdvisorError>;
}

fn build_client(timeout_seconds: u64) -> Result<reqwest::Client, AdvisorError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| AdvisorError::BackendUnavailable(format!("failed to build HTTP client: {}", e)))
}

/// Send `request` and decode a JSON reply, folding every failure into [`AdvisorError`].
async fn send_json<T: DeserializeOwned>(
    backend: &str,
    request: RequestBuilder,
) -> Result<T, AdvisorError> {
    let response = request
        .send()
        .await
        .map_err(|e| AdvisorError::BackendUnavailable(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AdvisorError::BackendUnavailable(format!(
            "{} returned {}: {}",
            backend,
            status,
            truncate_chars(&body, MAX_ERROR_BODY_CHARS)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AdvisorError::ResponseParseError(format!("{}: {}", backend, e)))
}

// --- Ollama ---

/// Local Ollama chat endpoint.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: &str, model: String, timeout_seconds: u64) -> Result<Self, AdvisorError> {
        Ok(Self {
            client: build_client(timeout_seconds)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> OllamaChat<'a> {
        OllamaChat {
            model: &self.model,
            messages: [
                OllamaMessage {
                    role: "system",
                    content: &request.system,
                },
                OllamaMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChat<'a> {
    model: &'a str,
    messages: [OllamaMessage<'a>; 2],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaReply {
    message: OllamaReplyMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaReplyMessage {
    content: String,
}

#[async_trait]
impl AiBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, AdvisorError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.model, "POST {}", url);

        let reply: OllamaReply =
            send_json("Ollama", self.client.post(&url).json(&self.body(request))).await?;
        Ok(reply.message.content)
    }
}

// --- Anthropic ---

#[cfg(feature = "remote-ai")]
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic messages API.
#[cfg(feature = "remote-ai")]
pub struct AnthropicBackend {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

#[cfg(feature = "remote-ai")]
impl AnthropicBackend {
    pub fn new(api_key: String, model: String, timeout_seconds: u64) -> Result<Self, AdvisorError> {
        Ok(Self {
            client: build_client(timeout_seconds)?,
            model,
            api_key,
        })
    }

    fn body<'a>(&'a self, request: &'a ChatRequest) -> AnthropicMessages<'a> {
        AnthropicMessages {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: &request.system,
            messages: [AnthropicMessage {
                role: "user",
                content: &request.user,
            }],
            temperature: request.temperature,
        }
    }
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct AnthropicMessages<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [AnthropicMessage<'a>; 1],
    temperature: f32,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicReply {
    content: Vec<AnthropicBlock>,
}

#[cfg(feature = "remote-ai")]
#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: String,
}

#[cfg(feature = "remote-ai")]
#[async_trait]
impl AiBackend for AnthropicBackend {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, AdvisorError> {
        debug!(model = %self.model, "POST {}", ANTHROPIC_URL);

        let call = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&self.body(request));
        let reply: AnthropicReply = send_json("Anthropic", call).await?;

        Ok(reply.content.into_iter().map(|block| block.text).collect())
    }
}

/// Create the configured backend, or `None` when no model is configured.
pub fn create_backend(config: &AiConfig) -> Result<Option<Arc<dyn AiBackend>>, AdvisorError> {
    let Some(model) = config.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) else {
        return Ok(None);
    };
    let model = model.to_string();

    let backend: Arc<dyn AiBackend> = match config.backend.as_str() {
        "ollama" => Arc::new(OllamaBackend::new(
            &config.base_url,
            model,
            config.timeout_seconds,
        )?),
        #[cfg(feature = "remote-ai")]
        "anthropic" => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                AdvisorError::BackendUnavailable(format!("{} env var not set", config.api_key_env))
            })?;
            Arc::new(AnthropicBackend::new(api_key, model, config.timeout_seconds)?)
        }
        other => {
            return Err(AdvisorError::BackendUnavailable(format!(
                "unsupported AI backend: {}",
                other
            )))
        }
    };
    Ok(Some(backend))
}

/// Canned backend for tests. Records every request it receives.
#[cfg(test)]
pub struct MockBackend {
    reply: String,
    pub requests: std::sync::Mutex<Vec<ChatRequest>>,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl AiBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, AdvisorError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Backend that always fails, for testing degraded advice.
#[cfg(test)]
pub struct FailingBackend;

#[cfg(test)]
#[async_trait]
impl AiBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn chat(&self, _request: &ChatRequest) -> Result<String, AdvisorError> {
        Err(AdvisorError::BackendUnavailable(
            "connection refused".to_string(),
        ))
    }
}
