//! Query results → natural-language answer

use crate::llm::{CompletionProvider, CompletionRequest};
use crate::neo4j::Record;
use serde::Serialize;
use std::sync::Arc;

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that converts database query results into natural language.";

/// Sentinel used in place of results when the query matched nothing
pub const NO_DATA: &str = "No data found.";

/// Records beyond this many are left out of the prompt
pub const MAX_PROMPT_RECORDS: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HumanizedAnswer {
    pub text: String,
    /// The completion service failed and `text` is a placeholder
    pub degraded: bool,
}

pub struct ResultHumanizer {
    llm: Arc<dyn CompletionProvider>,
    temperature: f32,
}

impl ResultHumanizer {
    pub fn new(llm: Arc<dyn CompletionProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    pub fn build_request(&self, question: &str, records: &[Record]) -> CompletionRequest {
        let prompt = format!(
            "User asked: \"{}\"\n\
             Neo4j returned: {}\n\
             Please generate a concise, human-readable answer in natural English.",
            question,
            render_results(records)
        );
        CompletionRequest::new(SYSTEM_PROMPT, prompt, self.temperature)
    }

    /// Phrase `records` as an answer to `question`. Never fails.
    pub async fn humanize(&self, question: &str, records: &[Record]) -> HumanizedAnswer {
        let request = self.build_request(question, records);
        match self.llm.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => HumanizedAnswer {
                text: text.trim().to_string(),
                degraded: false,
            },
            Ok(_) => degraded("completion service returned no content"),
            Err(e) => degraded(&e.to_string()),
        }
    }
}

fn degraded(message: &str) -> HumanizedAnswer {
    tracing::warn!(error = %message, "Answer generation degraded");
    HumanizedAnswer {
        text: format!("⚠️ Unable to generate an answer: {}", message),
        degraded: true,
    }
}

/// Render records for the prompt, or the no-data sentinel
pub fn render_results(records: &[Record]) -> String {
    if records.is_empty() {
        return NO_DATA.to_string();
    }
    let shown = &records[..records.len().min(MAX_PROMPT_RECORDS)];
    let mut text = serde_json::to_string(shown).unwrap_or_else(|_| format!("{:?}", shown));
    if shown.len() < records.len() {
        text.push_str(&format!(
            "\n(showing the first {} of {} records)",
            shown.len(),
            records.len()
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionError, MockCompletionProvider};
    use serde_json::json;

    fn user_record(name: &str) -> Record {
        json!({"u": {"user_id": "U1", "name": name}})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_render_empty_results() {
        assert_eq!(render_results(&[]), NO_DATA);
    }

    #[test]
    fn test_render_truncates_long_results() {
        let records: Vec<Record> = (0..75).map(|i| user_record(&format!("user{}", i))).collect();
        let text = render_results(&records);
        assert!(text.contains("user49"));
        assert!(!text.contains("user50"));
        assert!(text.ends_with("(showing the first 50 of 75 records)"));
    }

    #[tokio::test]
    async fn test_humanize_uses_completion() {
        let llm = Arc::new(MockCompletionProvider::new().with_reply("Commit C1 was made by Ada."));
        let humanizer = ResultHumanizer::new(llm.clone(), 0.0);

        let answer = humanizer
            .humanize("Who made commit C1?", &[user_record("Ada")])
            .await;
        assert_eq!(answer.text, "Commit C1 was made by Ada.");
        assert!(!answer.degraded);

        let prompt = llm.requests()[0].user_prompt().to_string();
        assert!(prompt.contains("User asked: \"Who made commit C1?\""));
        assert!(prompt.contains("\"name\":\"Ada\""));
        assert!(prompt.contains("concise, human-readable answer in natural English"));
    }

    #[tokio::test]
    async fn test_empty_results_prompt_says_no_data() {
        let llm = Arc::new(MockCompletionProvider::new().with_reply("No such commit exists."));
        let humanizer = ResultHumanizer::new(llm.clone(), 0.0);

        let answer = humanizer.humanize("Who made commit C999?", &[]).await;
        assert!(!answer.text.is_empty());
        assert!(llm.requests()[0].user_prompt().contains("Neo4j returned: No data found."));
    }

    #[tokio::test]
    async fn test_failures_degrade_instead_of_erroring() {
        let llm = Arc::new(
            MockCompletionProvider::new()
                .with_error(CompletionError::RateLimited)
                .with_reply("   "),
        );
        let humanizer = ResultHumanizer::new(llm, 0.0);

        let answer = humanizer.humanize("q", &[]).await;
        assert!(answer.degraded);
        assert_eq!(
            answer.text,
            "⚠️ Unable to generate an answer: completion service rate limit exceeded"
        );

        let answer = humanizer.humanize("q", &[]).await;
        assert!(answer.degraded);
        assert!(answer.text.starts_with("⚠️ Unable to generate an answer:"));
    }
}
