//! Test helper factories and mock state builders
#![allow(dead_code)]

use crate::api::handlers::{ApiState, ServerState};
use crate::llm::MockCompletionProvider;
use crate::neo4j::mock::MockGraphStore;
use crate::neo4j::models::{NodeWriteMode, Record};
use crate::{AppState, Config, LlmConfig};
use std::path::PathBuf;
use std::sync::Arc;

/// A complete configuration pointing at nothing real
pub fn test_config() -> Config {
    Config {
        neo4j_uri: "bolt://mock:7687".to_string(),
        neo4j_user: "neo4j".to_string(),
        neo4j_password: "mock".to_string(),
        neo4j_query_timeout_secs: 5,
        neo4j_max_result_rows: 1000,
        llm: LlmConfig {
            api_key: "sk-mock".to_string(),
            base_url: "http://mock:9999/v1".to_string(),
            model: "mock".to_string(),
            temperature: 0.0,
            timeout_secs: 30,
        },
        server_port: 0,
        data_dir: PathBuf::from("data"),
        ingest_node_mode: NodeWriteMode::Merge,
    }
}

/// Create a mock AppState with the given backends
pub fn mock_app_state_with(store: MockGraphStore, llm: MockCompletionProvider) -> AppState {
    AppState {
        store: Arc::new(store),
        llm: Arc::new(llm),
        config: Arc::new(test_config()),
    }
}

/// API state over the given mocks
pub fn mock_api_state(store: MockGraphStore, llm: MockCompletionProvider) -> ApiState {
    Arc::new(ServerState::from_app_state(&mock_app_state_with(store, llm)))
}

/// Build a record from a JSON object literal
pub fn record(value: serde_json::Value) -> Record {
    value
        .as_object()
        .cloned()
        .expect("record fixture must be a JSON object")
}
