//! One question through translate → execute → humanize

use super::error::QaError;
use super::executor::QueryExecutor;
use super::humanizer::ResultHumanizer;
use super::translator::QueryTranslator;
use crate::llm::CompletionProvider;
use crate::neo4j::{GraphStore, Record};
use crate::schema::SchemaCatalog;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Longest question accepted, in characters
pub const MAX_QUESTION_CHARS: usize = 2000;

/// Tunables of the pipeline, taken from [`Config`](crate::Config)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QaSettings {
    pub temperature: f32,
    pub query_timeout: Duration,
    pub max_result_rows: usize,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            query_timeout: Duration::from_secs(5),
            max_result_rows: 1000,
        }
    }
}

/// Body of a successful `/ask` response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AskResponse {
    pub query: String,
    pub cypher: String,
    pub raw_results: Vec<Record>,
    pub answer: String,
    #[serde(skip_serializing_if = "is_false")]
    pub answer_degraded: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Immutable once built; share it behind an `Arc`.
pub struct QaPipeline {
    translator: QueryTranslator,
    executor: QueryExecutor,
    humanizer: ResultHumanizer,
}

impl QaPipeline {
    pub fn new(
        store: Arc<dyn GraphStore>,
        llm: Arc<dyn CompletionProvider>,
        catalog: SchemaCatalog,
        settings: QaSettings,
    ) -> Self {
        Self {
            translator: QueryTranslator::new(llm.clone(), catalog, settings.temperature),
            executor: QueryExecutor::new(store, settings.query_timeout, settings.max_result_rows),
            humanizer: ResultHumanizer::new(llm, settings.temperature),
        }
    }

    /// Answer a question. A failed humanization still yields a response,
    /// flagged with `answer_degraded`.
    pub async fn ask(&self, question: &str) -> Result<AskResponse, QaError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QaError::InvalidQuestion(
                "query must not be empty".to_string(),
            ));
        }
        let length = question.chars().count();
        if length > MAX_QUESTION_CHARS {
            return Err(QaError::InvalidQuestion(format!(
                "query is {} characters long; the limit is {}",
                length, MAX_QUESTION_CHARS
            )));
        }

        let cypher = self.translator.translate(question).await?;
        tracing::info!(%cypher, "Question translated");

        let raw_results = self.executor.execute(&cypher).await?;
        let answer = self.humanizer.humanize(question, &raw_results).await;

        Ok(AskResponse {
            query: question.to_string(),
            cypher,
            raw_results,
            answer: answer.text,
            answer_degraded: answer.degraded,
        })
    }
}
