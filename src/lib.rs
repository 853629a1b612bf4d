//! Graph QA
//!
//! Natural-language questions over a Neo4j issue-tracking graph:
//! - completion service translates questions into Cypher
//! - generated queries are validated against a static schema catalog
//! - results are executed read-only and phrased back in English
//! - CSV ingestion populates the graph

pub mod api;
pub mod ingest;
pub mod llm;
pub mod neo4j;
pub mod qa;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use neo4j::models::NodeWriteMode;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LLM_BASE_URL: &str = "https://router.requesty.ai/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub llm: LlmYamlConfig,
    pub ingest: IngestYamlConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Neo4j section. Credentials have no defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub query_timeout_secs: u64,
    pub max_result_rows: usize,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: None,
            user: None,
            password: None,
            query_timeout_secs: 5,
            max_result_rows: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmYamlConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmYamlConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LLM_BASE_URL.into(),
            model: DEFAULT_LLM_MODEL.into(),
            temperature: 0.0,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestYamlConfig {
    pub data_dir: PathBuf,
    pub node_mode: NodeWriteMode,
}

impl Default for IngestYamlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            node_mode: NodeWriteMode::Merge,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Completion service settings
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// Empty when not configured; see [`Config::require_llm_api_key`]
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_query_timeout_secs: u64,
    pub neo4j_max_result_rows: usize,
    pub llm: LlmConfig,
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub ingest_node_mode: NodeWriteMode,
}

/// First non-empty value among `names`
fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

fn env_parse<T>(name: &'static str, fallback: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(&[name]) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(fallback),
    }
}

fn required(
    name: &'static str,
    env_names: &[&str],
    yaml: Option<String>,
) -> Result<String, ConfigError> {
    env_var(env_names)
        .or(yaml.filter(|v| !v.trim().is_empty()))
        .ok_or(ConfigError::Missing(name))
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. Neo4j credentials
    /// are required; the completion key is only checked when serving.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self, ConfigError> {
        let yaml = Self::load_yaml(yaml_path);

        let neo4j_uri = required("NEO4J_URI", &["NEO4J_URI"], yaml.neo4j.uri)?;
        let neo4j_user = required(
            "NEO4J_USERNAME",
            &["NEO4J_USERNAME", "NEO4J_USER"],
            yaml.neo4j.user,
        )?;
        let neo4j_password = required("NEO4J_PASSWORD", &["NEO4J_PASSWORD"], yaml.neo4j.password)?;

        let llm = LlmConfig {
            api_key: env_var(&["REQUESTY_API_KEY", "LLM_API_KEY"])
                .or(yaml.llm.api_key)
                .unwrap_or_default(),
            base_url: env_var(&["LLM_BASE_URL"]).unwrap_or(yaml.llm.base_url),
            model: env_var(&["LLM_MODEL"]).unwrap_or(yaml.llm.model),
            temperature: env_parse("LLM_TEMPERATURE", yaml.llm.temperature)?,
            timeout_secs: env_parse("LLM_TIMEOUT_SECS", yaml.llm.timeout_secs)?,
        };

        Ok(Self {
            neo4j_uri,
            neo4j_user,
            neo4j_password,
            neo4j_query_timeout_secs: env_parse(
                "NEO4J_QUERY_TIMEOUT_SECS",
                yaml.neo4j.query_timeout_secs,
            )?,
            neo4j_max_result_rows: env_parse("NEO4J_MAX_RESULT_ROWS", yaml.neo4j.max_result_rows)?,
            llm,
            server_port: env_parse("SERVER_PORT", yaml.server.port)?,
            data_dir: env_var(&["DATA_DIR"])
                .map(PathBuf::from)
                .unwrap_or(yaml.ingest.data_dir),
            ingest_node_mode: env_parse("INGEST_NODE_MODE", yaml.ingest.node_mode)?,
        })
    }

    /// The completion key, or an error if none is configured
    pub fn require_llm_api_key(&self) -> Result<&str, ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            Err(ConfigError::Missing("REQUESTY_API_KEY"))
        } else {
            Ok(&self.llm.api_key)
        }
    }

    pub fn qa_settings(&self) -> qa::QaSettings {
        qa::QaSettings {
            temperature: self.llm.temperature,
            query_timeout: Duration::from_secs(self.neo4j_query_timeout_secs),
            max_result_rows: self.neo4j_max_result_rows,
        }
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn neo4j::GraphStore>,
    pub llm: Arc<dyn llm::CompletionProvider>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Build the serving state. The completion key is checked before any
    /// connection is attempted.
    pub async fn new(config: Config) -> Result<Self> {
        config.require_llm_api_key()?;
        let llm = Arc::new(
            llm::HttpCompletionProvider::from_config(&config.llm)
                .context("Failed to build completion client")?,
        );

        let store = connect_store(&config).await?;

        Ok(Self {
            store,
            llm,
            config: Arc::new(config),
        })
    }
}

/// Connect to Neo4j and make sure the key indexes exist
pub async fn connect_store(config: &Config) -> Result<Arc<neo4j::Neo4jClient>> {
    let client = neo4j::Neo4jClient::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
    )
    .await?;
    tracing::info!(uri = %config.neo4j_uri, "Connected to Neo4j");
    Ok(Arc::new(client))
}

/// Serve the HTTP API until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;
    let router = api::create_router(Arc::new(api::handlers::ServerState::from_app_state(&state)));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
server:
  port: 9090

neo4j:
  uri: bolt://db:7687
  user: admin
  password: secret
  max_result_rows: 50

llm:
  api_key: yaml-key
  model: gpt-4o

ingest:
  data_dir: /srv/data
  node_mode: append
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.neo4j.uri.as_deref(), Some("bolt://db:7687"));
        assert_eq!(config.neo4j.max_result_rows, 50);
        assert_eq!(config.neo4j.query_timeout_secs, 5);
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, DEFAULT_LLM_BASE_URL);
        assert_eq!(config.ingest.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.ingest.node_mode, NodeWriteMode::Append);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.neo4j.uri.is_none());
        assert_eq!(config.neo4j.max_result_rows, 1000);
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.ingest.node_mode, NodeWriteMode::Merge);
    }

    /// Env vars are process-global, so every env-dependent case lives in
    /// this one test.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "NEO4J_URI",
                "NEO4J_USERNAME",
                "NEO4J_USER",
                "NEO4J_PASSWORD",
                "NEO4J_QUERY_TIMEOUT_SECS",
                "NEO4J_MAX_RESULT_ROWS",
                "REQUESTY_API_KEY",
                "LLM_API_KEY",
                "LLM_BASE_URL",
                "LLM_MODEL",
                "LLM_TEMPERATURE",
                "LLM_TIMEOUT_SECS",
                "SERVER_PORT",
                "DATA_DIR",
                "INGEST_NODE_MODE",
            ] {
                std::env::remove_var(var);
            }
        }

        let yaml = r#"
server:
  port: 9999
neo4j:
  uri: bolt://yaml-host:7687
  user: yaml-user
  password: yaml-pass
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        // YAML only
        clear_env();
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.server_port, 9999);
        assert_eq!(config.neo4j_uri, "bolt://yaml-host:7687");
        assert_eq!(config.neo4j_user, "yaml-user");
        assert_eq!(config.neo4j_query_timeout_secs, 5);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(
            config.require_llm_api_key(),
            Err(ConfigError::Missing("REQUESTY_API_KEY"))
        );

        // Env overrides YAML, aliases accepted
        std::env::set_var("NEO4J_URI", "bolt://env-host:7687");
        std::env::set_var("NEO4J_USER", "alias-user");
        std::env::set_var("SERVER_PORT", "7777");
        std::env::set_var("LLM_API_KEY", "sk-alias");
        std::env::set_var("INGEST_NODE_MODE", "append");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.neo4j_uri, "bolt://env-host:7687");
        assert_eq!(config.neo4j_user, "alias-user");
        assert_eq!(config.server_port, 7777);
        assert_eq!(config.require_llm_api_key(), Ok("sk-alias"));
        assert_eq!(config.ingest_node_mode, NodeWriteMode::Append);

        std::env::set_var("NEO4J_USERNAME", "primary-user");
        std::env::set_var("REQUESTY_API_KEY", "sk-primary");
        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.neo4j_user, "primary-user");
        assert_eq!(config.llm.api_key, "sk-primary");

        // Malformed numbers are rejected
        std::env::set_var("NEO4J_MAX_RESULT_ROWS", "lots");
        assert!(matches!(
            Config::from_yaml_and_env(Some(&file_path)),
            Err(ConfigError::Invalid {
                name: "NEO4J_MAX_RESULT_ROWS",
                ..
            })
        ));

        // No YAML and no env: credentials missing
        clear_env();
        let nonexistent = Path::new("/tmp/nonexistent-config-12345.yaml");
        assert_eq!(
            Config::from_yaml_and_env(Some(nonexistent)),
            Err(ConfigError::Missing("NEO4J_URI"))
        );

        std::env::set_var("NEO4J_URI", "bolt://localhost:7687");
        std::env::set_var("NEO4J_USERNAME", "neo4j");
        assert_eq!(
            Config::from_yaml_and_env(Some(nonexistent)),
            Err(ConfigError::Missing("NEO4J_PASSWORD"))
        );

        clear_env();
    }

    #[tokio::test]
    async fn test_app_state_requires_completion_key_before_connecting() {
        let mut config = crate::test_helpers::test_config();
        config.llm.api_key = String::new();
        // The URI is unreachable; failing on the key proves no connection was tried.
        config.neo4j_uri = "bolt://127.0.0.1:1".to_string();

        let err = AppState::new(config).await.err().unwrap();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::Missing("REQUESTY_API_KEY"))
        );
    }
}
