//! Natural-language question → Cypher query

use super::error::QaError;
use crate::llm::{CompletionProvider, CompletionRequest};
use crate::schema::{CypherValidator, SchemaCatalog};
use std::sync::Arc;

const SYSTEM_PROMPT: &str =
    "You are a Neo4j expert assistant that converts questions into Cypher queries.";

/// Builds translation prompts and checks what comes back
pub struct QueryTranslator {
    llm: Arc<dyn CompletionProvider>,
    catalog: SchemaCatalog,
    validator: CypherValidator,
    temperature: f32,
}

impl QueryTranslator {
    pub fn new(llm: Arc<dyn CompletionProvider>, catalog: SchemaCatalog, temperature: f32) -> Self {
        Self {
            llm,
            catalog,
            validator: CypherValidator::new(catalog),
            temperature,
        }
    }

    /// The exact request sent for `question`. Identical questions always
    /// produce identical requests.
    pub fn build_request(&self, question: &str) -> CompletionRequest {
        let prompt = format!(
            "You are an expert in Neo4j. Use the following schema and relationships to generate an exact Cypher query.\n\
             Do NOT invent any entities or relationships. Use only the given labels and relationships.\n\
             Return only the Cypher query, do NOT explain.\n\n\
             Graph Schema:\n{}\n\n\
             User Question: \"{}\"",
            self.catalog.describe(),
            question
        );
        CompletionRequest::new(SYSTEM_PROMPT, prompt, self.temperature)
    }

    /// Translate a question and validate the generated query
    pub async fn translate(&self, question: &str) -> Result<String, QaError> {
        let request = self.build_request(question);
        let reply = self.llm.complete(&request).await?;

        let cypher = strip_code_fences(&reply);
        if cypher.is_empty() {
            return Err(QaError::TranslationFailed(
                "completion service returned an empty query".to_string(),
            ));
        }

        match self.validator.validate(&cypher) {
            Ok(refs) => {
                tracing::debug!(
                    model = self.llm.model_name(),
                    labels = ?refs.labels,
                    relationships = ?refs.relationships,
                    "Generated query accepted"
                );
                Ok(cypher)
            }
            Err(violation) => {
                tracing::warn!(%cypher, %violation, "Generated query rejected");
                Err(violation.into())
            }
        }
    }
}

/// Remove surrounding whitespace and a Markdown code fence, if any
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    let body = match rest.find('\n') {
        Some(i) if rest[..i].trim().chars().all(|c| c.is_ascii_alphanumeric()) => &rest[i + 1..],
        _ => strip_fence_tag(rest),
    };
    body.trim().to_string()
}

/// Language tags seen on single-line fences
const FENCE_TAGS: &[&str] = &["cypher", "neo4j", "cql", "sql"];

/// Drop a language tag that shares its line with the query
fn strip_fence_tag(body: &str) -> &str {
    let body = body.trim_start();
    match body.split_once(char::is_whitespace) {
        Some((tag, query)) if FENCE_TAGS.contains(&tag.to_ascii_lowercase().as_str()) => query,
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionError, MockCompletionProvider};
    use crate::schema::SchemaViolation;

    fn translator(llm: MockCompletionProvider) -> (QueryTranslator, Arc<MockCompletionProvider>) {
        let llm = Arc::new(llm);
        (
            QueryTranslator::new(llm.clone(), SchemaCatalog::standard(), 0.0),
            llm,
        )
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(
            strip_code_fences("```cypher\nMATCH (n:User) RETURN n\n```"),
            "MATCH (n:User) RETURN n"
        );
        assert_eq!(
            strip_code_fences("```\nMATCH (n:User) RETURN n\n```\n"),
            "MATCH (n:User) RETURN n"
        );
        assert_eq!(
            strip_code_fences("```MATCH (n:User) RETURN n```"),
            "MATCH (n:User) RETURN n"
        );
        assert_eq!(
            strip_code_fences("  MATCH (n:User) RETURN n \n"),
            "MATCH (n:User) RETURN n"
        );
    }

    #[test]
    fn test_strip_inline_fence_tag() {
        assert_eq!(
            strip_code_fences("```cypher MATCH (n:User) RETURN n```"),
            "MATCH (n:User) RETURN n"
        );
        assert_eq!(
            strip_code_fences("```Cypher MATCH (n:User)\nRETURN n\n```"),
            "MATCH (n:User)\nRETURN n"
        );
    }

    #[test]
    fn test_request_contains_schema_and_question() {
        let (translator, _) = translator(MockCompletionProvider::new());
        let request = translator.build_request("Who made commit C1?");

        assert_eq!(request.temperature, 0.0);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        let prompt = request.user_prompt();
        assert!(prompt.contains("- Commit(commit_id, message, author_id, issue_id)"));
        assert!(prompt.contains("- User-MADE->Commit"));
        assert!(prompt.contains("User Question: \"Who made commit C1?\""));
        assert!(prompt.contains("Return only the Cypher query"));
    }

    #[tokio::test]
    async fn test_identical_questions_send_identical_requests() {
        let reply = "MATCH (c:Commit {commit_id:'C1'})<-[:MADE]-(u:User) RETURN u;";
        let (translator, llm) = translator(MockCompletionProvider::new().with_fallback(Ok(reply.to_string())));

        let first = translator.translate("Who made commit C1?").await.unwrap();
        let second = translator.translate("Who made commit C1?").await.unwrap();

        assert_eq!(first, second);
        let requests = llm.requests();
        assert_eq!(requests[0], requests[1]);
    }

    #[tokio::test]
    async fn test_generated_write_query_is_rejected() {
        let (translator, _) =
            translator(MockCompletionProvider::new().with_reply("MATCH (u:User) DETACH DELETE u"));
        let err = translator.translate("Remove every user").await.unwrap_err();
        assert!(matches!(
            err,
            QaError::SchemaViolation(SchemaViolation::WriteClause(_))
        ));
    }

    #[tokio::test]
    async fn test_invented_label_is_rejected() {
        let (translator, _) = translator(
            MockCompletionProvider::new().with_reply("```cypher\nMATCH (t:Team) RETURN t\n```"),
        );
        assert_eq!(
            translator.translate("List the teams").await,
            Err(QaError::SchemaViolation(SchemaViolation::UnknownLabel(
                "Team".to_string()
            )))
        );
    }

    #[tokio::test]
    async fn test_completion_failures() {
        let (translator, _) = translator(
            MockCompletionProvider::new()
                .with_error(CompletionError::Unreachable("dns".to_string()))
                .with_error(CompletionError::Timeout)
                .with_reply("```\n```"),
        );
        assert!(matches!(
            translator.translate("q").await,
            Err(QaError::TranslationFailed(_))
        ));
        assert!(matches!(
            translator.translate("q").await,
            Err(QaError::Timeout(_))
        ));
        assert!(matches!(
            translator.translate("q").await,
            Err(QaError::TranslationFailed(_))
        ));
    }
}
