//! Neo4j client for interacting with the knowledge graph

use super::models::*;
use super::traits::StoreError;
use anyhow::{Context, Result};
use neo4rs::{query, BoltMap, BoltString, BoltType, Graph, Query};
use std::sync::Arc;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

/// Classify a driver error by whether a retry could succeed.
fn classify(err: neo4rs::Error) -> StoreError {
    match err {
        neo4rs::Error::IOError { .. }
        | neo4rs::Error::ConnectionError
        | neo4rs::Error::AuthenticationError(_) => StoreError::Connection(err.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

/// Build the Bolt map used as `$props` for a node write
fn properties_map(node: &NodeWrite) -> BoltMap {
    let mut props = BoltMap::new();
    for (name, value) in &node.properties {
        props.put(
            BoltString::from(name.as_str()),
            BoltType::String(BoltString::from(value.as_str())),
        );
    }
    props
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Create lookup indexes on every label's key property.
    ///
    /// Plain indexes rather than uniqueness constraints, so append-mode
    /// ingestion keeps working on graphs that already hold duplicates.
    async fn init_schema(&self) -> Result<()> {
        for label in NodeLabel::ALL {
            let cypher = format!(
                "CREATE INDEX {}_key IF NOT EXISTS FOR (n:{}) ON (n.{})",
                label.key_field(),
                label.as_str(),
                label.key_field()
            );
            if let Err(e) = self.graph.run(query(&cypher)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a parameterized Cypher query (internal use only)
    async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>, StoreError> {
        let mut result = self.graph.execute(q).await.map_err(classify)?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await.map_err(classify)? {
            rows.push(row);
        }
        Ok(rows)
    }

    // ========================================================================
    // Read path
    // ========================================================================

    /// Run a query in its own transaction and roll it back afterwards.
    ///
    /// The rollback happens on the success path as well, so nothing the query
    /// might have written is ever committed.
    pub async fn run_read_query(
        &self,
        cypher: &str,
        max_rows: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut txn = self.graph.start_txn().await.map_err(classify)?;

        let collected = async {
            let mut stream = txn.execute(query(cypher)).await.map_err(classify)?;
            let mut records = Vec::new();
            while let Some(row) = stream.next(txn.handle()).await.map_err(classify)? {
                if records.len() >= max_rows {
                    tracing::warn!(max_rows, "Result truncated at row limit");
                    break;
                }
                records.push(row_to_record(&row)?);
            }
            Ok::<_, StoreError>(records)
        }
        .await;

        if let Err(e) = txn.rollback().await {
            tracing::debug!("Rollback of read transaction failed: {}", e);
        }

        collected
    }

    // ========================================================================
    // Write path (ingestion)
    // ========================================================================

    /// Write a node, merging on its key property or appending a fresh one
    pub async fn write_node(
        &self,
        node: &NodeWrite,
        mode: NodeWriteMode,
    ) -> Result<NodeWriteOutcome, StoreError> {
        let label = node.label.as_str();
        let key_field = node.label.key_field();

        let cypher = match mode {
            NodeWriteMode::Merge => format!(
                r#"
                OPTIONAL MATCH (existing:{label} {{{key_field}: $key}})
                WITH count(existing) AS before
                MERGE (n:{label} {{{key_field}: $key}})
                SET n += $props
                RETURN before = 0 AS created
                "#
            ),
            NodeWriteMode::Append => format!(
                r#"
                CREATE (n:{label} {{{key_field}: $key}})
                SET n += $props
                RETURN true AS created
                "#
            ),
        };

        let q = query(&cypher)
            .param("key", node.key.clone())
            .param("props", BoltType::Map(properties_map(node)));

        let rows = self.execute_with_params(q).await?;
        let created = match rows.first() {
            Some(row) => row
                .get::<bool>("created")
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            None => return Err(StoreError::Query(format!("no result writing {} node", label))),
        };

        Ok(if created {
            NodeWriteOutcome::Created
        } else {
            NodeWriteOutcome::Updated
        })
    }

    /// MERGE a relationship between two existing nodes
    pub async fn merge_relationship(
        &self,
        rel_type: RelationshipType,
        from_key: &str,
        to_key: &str,
    ) -> Result<LinkOutcome, StoreError> {
        let from = rel_type.from_label();
        let to = rel_type.to_label();

        let cypher = format!(
            r#"
            MATCH (a:{from_label} {{{from_field}: $from_key}})
            MATCH (b:{to_label} {{{to_field}: $to_key}})
            OPTIONAL MATCH (a)-[existing:{rel}]->(b)
            WITH a, b, count(existing) AS before
            MERGE (a)-[:{rel}]->(b)
            RETURN count(*) AS matched,
                   sum(CASE WHEN before = 0 THEN 1 ELSE 0 END) AS created
            "#,
            from_label = from.as_str(),
            from_field = from.key_field(),
            to_label = to.as_str(),
            to_field = to.key_field(),
            rel = rel_type.as_str(),
        );

        let q = query(&cypher)
            .param("from_key", from_key.to_string())
            .param("to_key", to_key.to_string());

        let rows = self.execute_with_params(q).await?;
        let Some(row) = rows.first() else {
            return Ok(LinkOutcome::MissingEndpoint);
        };
        let matched = row
            .get::<i64>("matched")
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let created = row
            .get::<i64>("created")
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(match (matched, created) {
            (0, _) => LinkOutcome::MissingEndpoint,
            (_, 0) => LinkOutcome::AlreadyLinked,
            _ => LinkOutcome::Created,
        })
    }

    /// Check connectivity
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        let rows = self.execute_with_params(query("RETURN 1 AS ping")).await?;
        Ok(!rows.is_empty())
    }
}

/// Convert a driver row into a JSON record keyed by column name
fn row_to_record(row: &neo4rs::Row) -> Result<Record, StoreError> {
    match row.to::<serde_json::Value>() {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Decode(format!(
            "expected a keyed row, got {}",
            other
        ))),
        Err(e) => Err(StoreError::Decode(e.to_string())),
    }
}
