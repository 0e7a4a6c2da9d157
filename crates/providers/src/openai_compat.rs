//! OpenAI-compatible provider client.
//!
//! Implements both capability traits against one endpoint family:
//! - [`shopclerk_core::EmbeddingProvider`] via `POST /embeddings`
//! - [`shopclerk_core::Generator`] via `POST /chat/completions`
//!
//! Works with: OpenAI, Groq, Together AI, Fireworks AI, vLLM, Ollama, and
//! any other OpenAI-compatible endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use shopclerk_core::{EmbeddingProvider, Generator, ProviderError};
use tracing::{debug, warn};

/// System prompt prepended to every generation request.
const SYSTEM_PROMPT: &str = "You are a helpful retail assistant. Only use the context provided. \
     Answer concisely, friendly, and suggest the best store based on user history and location.";

/// An OpenAI-compatible model-service client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    chat_model: String,
    embedding_model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new client against an arbitrary OpenAI-compatible base URL.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            chat_model: chat_model.into(),
            embedding_model: embedding_model.into(),
            temperature: 0.7,
            max_tokens: 256,
            client,
        }
    }

    /// Create a Groq client (convenience constructor).
    pub fn groq(
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self::new(
            "groq",
            "https://api.groq.com/openai/v1",
            api_key,
            chat_model,
            embedding_model,
        )
    }

    /// Create an OpenAI client (convenience constructor).
    pub fn openai(
        api_key: impl Into<String>,
        chat_model: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self::new(
            "openai",
            "https://api.openai.com/v1",
            api_key,
            chat_model,
            embedding_model,
        )
    }

    /// Override the generation sampling parameters.
    pub fn with_generation_params(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Provider name. Inherent so callers holding the concrete type don't
    /// have to disambiguate between the two capability traits.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status == 200 {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "provider returned error");
        Err(map_error_status(status, error_body))
    }
}

/// Map a non-200 status to the provider error taxonomy.
fn map_error_status(status: u16, body: String) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: 5,
        },
        401 | 403 => ProviderError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ),
        _ => ProviderError::ApiError {
            status_code: status,
            message: body,
        },
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": texts,
            "encoding_format": "float",
        });

        debug!(
            provider = %self.name,
            model = %self.embedding_model,
            count = texts.len(),
            "sending embedding request"
        );

        let response = self.post_json("/embeddings", &body).await?;
        let api_resp: EmbeddingApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        Ok(parse_embedding_data(api_resp))
    }
}

#[async_trait]
impl Generator for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false,
        });

        debug!(provider = %self.name, model = %self.chat_model, "sending completion request");

        let response = self.post_json("/chat/completions", &body).await?;
        let api_resp: ChatApiResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse completion response: {e}"),
            })?;

        let choice = api_resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

// ── API DTOs ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Order embeddings by their reported index — providers may batch
/// out of order, and vector/metadata pairing depends on input order.
fn parse_embedding_data(resp: EmbeddingApiResponse) -> Vec<Vec<f32>> {
    let mut data = resp.data;
    data.sort_by_key(|d| d.index);
    data.into_iter().map(|d| d.embedding).collect()
}
