//! HTTP client for the live narrator
//!
//! A model-agnostic client for chat-completion APIs. Supports both Anthropic
//! and OpenAI-compatible APIs (DeepSeek, etc), chosen from the URL.
//!
//! The engine is synchronous, so the client owns a current-thread runtime
//! and blocks on each request.

use crate::core::config::BackendConfig;
use crate::core::error::{DuelError, Result};
use crate::llm::backend::{CompletionEndpoint, CompletionRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};

/// Keys shorter than this (after trimming) are rejected outright
pub const MIN_API_KEY_LEN: usize = 10;

/// API format type
#[derive(Debug, Clone, PartialEq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Blocking LLM client
///
/// Requests run on the client's own current-thread runtime. Calling
/// `complete` from inside another tokio runtime is refused with
/// `BackendCallFailed`; async callers should wrap the engine in
/// `tokio::task::spawn_blocking`.
pub struct LlmClient {
    client: Client,
    runtime: Runtime,
    api_key: String,
    api_url: String,
    model: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Build a client for `api_key` using the endpoint settings in `config`
    pub fn new(api_key: &str, config: &BackendConfig) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.len() < MIN_API_KEY_LEN {
            return Err(DuelError::BackendUnavailable(format!(
                "API key is shorter than {} characters",
                MIN_API_KEY_LEN
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DuelError::BackendUnavailable(e.to_string()))?;

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| DuelError::BackendUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            runtime,
            api_key: api_key.to_string(),
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            api_format: Self::detect_api_format(&config.api_url),
        })
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    pub fn api_format(&self) -> &ApiFormat {
        &self.api_format
    }

    /// Send a completion request to the LLM
    pub async fn complete_async(&self, request: &CompletionRequest<'_>) -> Result<String> {
        match self.api_format {
            ApiFormat::Anthropic => self.complete_anthropic(request).await,
            ApiFormat::OpenAI => self.complete_openai(request).await,
        }
    }

    async fn complete_anthropic(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user".into(),
                content: request.prompt.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DuelError::BackendCallFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DuelError::BackendCallFailed(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| DuelError::BackendCallFailed(e.to_string()))?;

        completion
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| DuelError::BackendCallFailed("Empty response".into()))
    }

    async fn complete_openai(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let body = OpenAIRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user".into(),
                content: request.prompt.into(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| DuelError::BackendCallFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DuelError::BackendCallFailed(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let completion: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| DuelError::BackendCallFailed(e.to_string()))?;

        completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| DuelError::BackendCallFailed("Empty response".into()))
    }
}

impl CompletionEndpoint for LlmClient {
    fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        // block_on panics when nested in a running runtime
        if Handle::try_current().is_ok() {
            return Err(DuelError::BackendCallFailed(
                "blocking request made from an async context, use spawn_blocking".into(),
            ));
        }
        self.runtime.block_on(self.complete_async(request))
    }
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    // null when the model refuses or is cut off
    content: Option<String>,
}

// Shared
#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}
