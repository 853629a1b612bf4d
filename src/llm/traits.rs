//! CompletionProvider trait definition
//!
//! async trait + Send + Sync so it can be shared as
//! `Arc<dyn CompletionProvider>` across request handlers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message of a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A single completion call: the conversation plus sampling settings
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

impl CompletionRequest {
    /// A system instruction followed by one user turn
    pub fn new(system: impl Into<String>, user: impl Into<String>, temperature: f32) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
        }
    }

    /// Content of the last user message
    pub fn user_prompt(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

/// Failures of the completion service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompletionError {
    #[error("completion service unreachable: {0}")]
    Unreachable(String),
    #[error("completion service timed out")]
    Timeout,
    #[error("completion service rate limit exceeded")]
    RateLimited,
    #[error("completion service error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("completion service returned no content")]
    Empty,
    #[error("could not build completion client: {0}")]
    Client(String),
}

/// Abstract interface for text completion.
///
/// # Implementations
///
/// - [`HttpCompletionProvider`](super::HttpCompletionProvider): OpenAI-compatible HTTP API
/// - [`MockCompletionProvider`](super::MockCompletionProvider): scripted, for tests
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Return the assistant's reply to `request`.
    ///
    /// Never returns an empty string; an empty reply is `CompletionError::Empty`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;

    /// The model used for completions, for logging
    fn model_name(&self) -> &str;
}
