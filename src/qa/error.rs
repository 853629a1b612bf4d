//! Errors of the question-answering pipeline

use crate::llm::CompletionError;
use crate::neo4j::StoreError;
use crate::schema::SchemaViolation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum QaError {
    /// The question itself is unusable (empty, too long)
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// The completion service produced no usable query
    #[error("could not translate question: {0}")]
    TranslationFailed(String),

    /// The generated query is not a read query over the known schema
    #[error("generated query rejected: {0}")]
    SchemaViolation(#[from] SchemaViolation),

    /// The graph engine rejected or failed the query
    #[error("query execution failed: {0}")]
    QueryExecutionFailed(String),

    /// The graph database could not be reached; the caller may retry
    #[error("graph database unavailable: {0}")]
    ConnectionFailed(String),

    #[error("{0} timed out")]
    Timeout(String),
}

impl From<CompletionError> for QaError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Timeout => QaError::Timeout("completion service".to_string()),
            other => QaError::TranslationFailed(other.to_string()),
        }
    }
}

impl From<StoreError> for QaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(msg) => QaError::ConnectionFailed(msg),
            StoreError::Query(msg) | StoreError::Decode(msg) => QaError::QueryExecutionFailed(msg),
        }
    }
}
