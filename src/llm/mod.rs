//! Chat-completion access
//!
//! Same shape as the graph layer (trait + impl + mock):
//! - `CompletionProvider` trait: async interface for a single completion
//! - `HttpCompletionProvider`: any OpenAI-compatible `/chat/completions` API
//!   (the Requesty router by default)
//! - `MockCompletionProvider`: scripted responses for tests

pub mod mock;
pub mod provider;
pub mod traits;

pub use mock::MockCompletionProvider;
pub use provider::HttpCompletionProvider;
pub use traits::{ChatMessage, ChatRole, CompletionError, CompletionProvider, CompletionRequest};
