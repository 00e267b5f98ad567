//! OpenAI-backed embedding and completion providers.
//!
//! Both clients call the OpenAI HTTP API directly via `reqwest` with the
//! configured request deadline attached to the client, so a slow endpoint
//! surfaces as [`AssistantError::ProviderTimeout`] rather than hanging the
//! question flow.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::CompletionModel;
use crate::embedding::EmbeddingProvider;
use crate::error::{AssistantError, Result};

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Dimensionality of `text-embedding-3-small`.
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

fn build_client(provider: &str, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build().map_err(|e| {
        AssistantError::ProviderUnavailable {
            provider: provider.to_string(),
            message: format!("failed to build HTTP client: {e}"),
        }
    })
}

fn request_error(provider: &str, timeout: Duration, e: reqwest::Error) -> AssistantError {
    if e.is_timeout() {
        AssistantError::ProviderTimeout {
            provider: provider.to_string(),
            seconds: timeout.as_secs(),
        }
    } else {
        AssistantError::ProviderUnavailable {
            provider: provider.to_string(),
            message: format!("request failed: {e}"),
        }
    }
}

/// Extract a readable message from an OpenAI error body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiEmbeddings {
    /// Create a new provider with the given API key, model, and deadline.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ProviderUnavailable`] if the key is empty
    /// or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AssistantError::ProviderUnavailable {
                provider: "openai-embeddings".to_string(),
                message: "API key must not be empty".to_string(),
            });
        }
        Ok(Self {
            client: build_client("openai-embeddings", timeout)?,
            api_key,
            model: model.into(),
            timeout,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text]).await?;
        vectors.into_iter().next().ok_or_else(|| AssistantError::ProviderUnavailable {
            provider: self.name().to_string(),
            message: "API returned an empty response".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = self.name(), batch_size = texts.len(), model = %self.model, "embedding batch");

        let request = EmbeddingRequest { model: &self.model, input: texts.to_vec() };
        let response = self
            .client
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.name(), error = %e, "embedding request failed");
                request_error(self.name(), self.timeout, e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = self.name(), %status, "embeddings API error");
            return Err(AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: format!("API returned {status}: {}", error_detail(&body)),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = self.name(), error = %e, "failed to parse embeddings response");
            AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        if parsed.data.len() != texts.len() {
            return Err(AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: format!(
                    "API returned {} embeddings for {} inputs",
                    parsed.data.len(),
                    texts.len()
                ),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSIONS
    }

    fn name(&self) -> &str {
        "openai-embeddings"
    }
}

// ── Completions ────────────────────────────────────────────────────

/// A [`CompletionModel`] backed by the OpenAI chat completions API.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiCompletions {
    /// Create a new completion client with the given API key, model, and deadline.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::ProviderUnavailable`] if the key is empty
    /// or the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AssistantError::ProviderUnavailable {
                provider: "openai-completions".to_string(),
                message: "API key must not be empty".to_string(),
            });
        }
        Ok(Self {
            client: build_client("openai-completions", timeout)?,
            api_key,
            model: model.into(),
            timeout,
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiCompletions {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(provider = self.name(), model = %self.model, prompt_len = prompt.len(), "completion request");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = self.name(), error = %e, "completion request failed");
                request_error(self.name(), self.timeout, e)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = self.name(), %status, "completions API error");
            return Err(AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: format!("API returned {status}: {}", error_detail(&body)),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = self.name(), error = %e, "failed to parse completion response");
            AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| AssistantError::ProviderUnavailable {
                provider: self.name().to_string(),
                message: "API returned no completion text".to_string(),
            })
    }

    fn name(&self) -> &str {
        "openai-completions"
    }
}
