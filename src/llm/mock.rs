//! Mock completion provider for tests
//!
//! Replies are scripted in FIFO order; every request is recorded so tests can
//! inspect the prompts that were sent.

use super::traits::{CompletionError, CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Scripted completion provider.
///
/// When the script runs out, `fallback` is returned (or `Empty` if unset).
#[derive(Debug, Default)]
pub struct MockCompletionProvider {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    fallback: Option<Result<String, CompletionError>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockCompletionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply
    pub fn with_reply(self, content: impl Into<String>) -> Self {
        self.push(Ok(content.into()));
        self
    }

    /// Queue a failure
    pub fn with_error(self, err: CompletionError) -> Self {
        self.push(Err(err));
        self
    }

    /// Reply used once the queue is exhausted
    pub fn with_fallback(mut self, reply: Result<String, CompletionError>) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn push(&self, reply: Result<String, CompletionError>) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let next = self
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match next.or_else(|| self.fallback.clone()) {
            Some(reply) => reply,
            None => Err(CompletionError::Empty),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
