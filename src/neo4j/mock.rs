//! In-memory mock implementation of GraphStore for testing.
//!
//! Nodes and edges live in `tokio::sync::RwLock` collections; read queries
//! return scripted results in FIFO order. Conditionally compiled with
//! `#[cfg(test)]`.

use crate::neo4j::models::*;
use crate::neo4j::traits::{GraphStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::RwLock;

/// A node held by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct StoredNode {
    pub label: NodeLabel,
    pub key: String,
    pub properties: BTreeMap<String, String>,
}

/// In-memory mock implementation of GraphStore for testing.
pub struct MockGraphStore {
    pub nodes: RwLock<Vec<StoredNode>>,
    pub edges: RwLock<Vec<(RelationshipType, String, String)>>,
    /// Results handed out by `run_read_query`, front first. Empty → `Ok(vec![])`.
    pub read_results: RwLock<VecDeque<Result<Vec<Record>, StoreError>>>,
    /// Every query passed to `run_read_query`
    pub executed_queries: RwLock<Vec<String>>,
    /// Error returned by every write, when set
    pub write_error: RwLock<Option<StoreError>>,
    pub read_delay: Option<Duration>,
    pub healthy: bool,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(Vec::new()),
            edges: RwLock::new(Vec::new()),
            read_results: RwLock::new(VecDeque::new()),
            executed_queries: RwLock::new(Vec::new()),
            write_error: RwLock::new(None),
            read_delay: None,
            healthy: true,
        }
    }

    // ========================================================================
    // Builder / seeding methods for tests
    // ========================================================================

    /// Seed a node into the store.
    pub async fn with_node(self, label: NodeLabel, key: &str, props: &[(&str, &str)]) -> Self {
        self.nodes.write().await.push(StoredNode {
            label,
            key: key.to_string(),
            properties: props
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        self
    }

    /// Seed an edge into the store (endpoints are not checked).
    pub async fn with_edge(self, rel_type: RelationshipType, from: &str, to: &str) -> Self {
        self.edges
            .write()
            .await
            .push((rel_type, from.to_string(), to.to_string()));
        self
    }

    /// Queue the result of the next read query.
    pub async fn with_read_result(self, result: Result<Vec<Record>, StoreError>) -> Self {
        self.read_results.write().await.push_back(result);
        self
    }

    /// Make every write fail with `err`.
    pub async fn with_write_error(self, err: StoreError) -> Self {
        *self.write_error.write().await = Some(err);
        self
    }

    /// Delay every read query, for timeout tests.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    // ========================================================================
    // Inspection helpers
    // ========================================================================

    pub async fn count_nodes(&self, label: NodeLabel) -> usize {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|n| n.label == label)
            .count()
    }

    pub async fn count_edges(&self, rel_type: RelationshipType) -> usize {
        self.edges
            .read()
            .await
            .iter()
            .filter(|(t, _, _)| *t == rel_type)
            .count()
    }

    pub async fn node(&self, label: NodeLabel, key: &str) -> Option<StoredNode> {
        self.nodes
            .read()
            .await
            .iter()
            .find(|n| n.label == label && n.key == key)
            .cloned()
    }

    async fn node_exists(&self, label: NodeLabel, key: &str) -> bool {
        self.nodes
            .read()
            .await
            .iter()
            .any(|n| n.label == label && n.key == key)
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStore for MockGraphStore {
    async fn run_read_query(
        &self,
        cypher: &str,
        max_rows: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.executed_queries.write().await.push(cypher.to_string());
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.read_results.write().await.pop_front();
        match next {
            Some(Ok(mut records)) => {
                records.truncate(max_rows);
                Ok(records)
            }
            Some(Err(e)) => Err(e),
            None => Ok(vec![]),
        }
    }

    async fn write_node(
        &self,
        node: &NodeWrite,
        mode: NodeWriteMode,
    ) -> Result<NodeWriteOutcome, StoreError> {
        if let Some(err) = self.write_error.read().await.clone() {
            return Err(err);
        }

        let mut nodes = self.nodes.write().await;
        if mode == NodeWriteMode::Merge {
            if let Some(existing) = nodes
                .iter_mut()
                .find(|n| n.label == node.label && n.key == node.key)
            {
                existing.properties.extend(node.properties.clone());
                return Ok(NodeWriteOutcome::Updated);
            }
        }
        nodes.push(StoredNode {
            label: node.label,
            key: node.key.clone(),
            properties: node.properties.clone(),
        });
        Ok(NodeWriteOutcome::Created)
    }

    async fn merge_relationship(
        &self,
        rel_type: RelationshipType,
        from_key: &str,
        to_key: &str,
    ) -> Result<LinkOutcome, StoreError> {
        if let Some(err) = self.write_error.read().await.clone() {
            return Err(err);
        }

        if !self.node_exists(rel_type.from_label(), from_key).await
            || !self.node_exists(rel_type.to_label(), to_key).await
        {
            return Ok(LinkOutcome::MissingEndpoint);
        }

        let mut edges = self.edges.write().await;
        let edge = (rel_type, from_key.to_string(), to_key.to_string());
        if edges.contains(&edge) {
            return Ok(LinkOutcome::AlreadyLinked);
        }
        edges.push(edge);
        Ok(LinkOutcome::Created)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(self.healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_merge_relationship_requires_both_endpoints() {
        let store = MockGraphStore::new()
            .with_node(NodeLabel::User, "U1", &[("name", "Ada")])
            .await;

        let outcome = store
            .merge_relationship(RelationshipType::Made, "U1", "C404")
            .await
            .unwrap();
        assert_eq!(outcome, LinkOutcome::MissingEndpoint);
        assert_eq!(store.count_edges(RelationshipType::Made).await, 0);
    }

    #[tokio::test]
    async fn test_seeded_edge_is_already_linked() {
        let store = MockGraphStore::new()
            .with_node(NodeLabel::User, "U1", &[])
            .await
            .with_node(NodeLabel::Commit, "C1", &[])
            .await
            .with_edge(RelationshipType::Made, "U1", "C1")
            .await;

        let outcome = store
            .merge_relationship(RelationshipType::Made, "U1", "C1")
            .await
            .unwrap();
        assert_eq!(outcome, LinkOutcome::AlreadyLinked);
        assert_eq!(store.count_edges(RelationshipType::Made).await, 1);
    }

    #[tokio::test]
    async fn test_read_results_are_served_in_order() {
        let mut record = Record::new();
        record.insert("n".to_string(), serde_json::json!(1));
        let store = MockGraphStore::new()
            .with_read_result(Ok(vec![record.clone(), record.clone()]))
            .await
            .with_read_result(Err(StoreError::Query("syntax".to_string())))
            .await;

        assert_eq!(store.run_read_query("A", 1).await.unwrap().len(), 1);
        assert!(store.run_read_query("B", 10).await.is_err());
        assert!(store.run_read_query("C", 10).await.unwrap().is_empty());
        assert_eq!(*store.executed_queries.read().await, vec!["A", "B", "C"]);
    }
}
