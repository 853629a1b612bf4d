//! HTTP completion provider implementation
//!
//! Implements `CompletionProvider` against any OpenAI-compatible
//! `/chat/completions` endpoint. The default target is the Requesty router
//! (`https://router.requesty.ai/v1`), which proxies to the configured model.
//!
//! Configuration comes from [`LlmConfig`](crate::LlmConfig):
//! - `REQUESTY_API_KEY` / `LLM_API_KEY` (required)
//! - `LLM_BASE_URL` (default: `https://router.requesty.ai/v1`)
//! - `LLM_MODEL` (default: `gpt-4`)
//! - `LLM_TIMEOUT_SECS` (default: `30`)

use super::traits::{ChatMessage, CompletionError, CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP-based completion provider using the OpenAI chat API format.
///
/// Cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct HttpCompletionProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl HttpCompletionProvider {
    /// Create a provider for `{base_url}/chat/completions`.
    pub fn new(
        base_url: &str,
        model: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CompletionError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model,
            api_key,
        })
    }

    pub fn from_config(config: &crate::LlmConfig) -> Result<Self, CompletionError> {
        Self::new(
            &config.base_url,
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

fn transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout
    } else {
        CompletionError::Unreachable(err.to_string())
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(CompletionError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error)
                .map(|d| d.message)
                .unwrap_or(text);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CompletionError::Empty);
        }

        tracing::debug!(model = %self.model, chars = content.len(), "Completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
