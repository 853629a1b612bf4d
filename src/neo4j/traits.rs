//! GraphStore trait definition
//!
//! Defines the abstract interface for all Neo4j graph operations.
//! This trait mirrors the public async methods of `Neo4jClient`,
//! enabling testing with mock implementations.

use crate::neo4j::models::*;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a graph store, classified by whether retrying can help.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// Network, authentication or pool failure; the caller may retry later
    #[error("graph database unreachable: {0}")]
    Connection(String),
    /// The engine rejected or failed the query; retrying will not help
    #[error("graph query failed: {0}")]
    Query(String),
    /// A result row could not be converted into a record
    #[error("could not decode graph result: {0}")]
    Decode(String),
}

/// Abstract interface for graph database operations.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a query read-only and return at most `max_rows` records.
    ///
    /// Implementations must not leave any write performed by the query
    /// committed.
    async fn run_read_query(&self, cypher: &str, max_rows: usize)
        -> Result<Vec<Record>, StoreError>;

    /// Write a node. In `Merge` mode the key property identifies the node.
    async fn write_node(
        &self,
        node: &NodeWrite,
        mode: NodeWriteMode,
    ) -> Result<NodeWriteOutcome, StoreError>;

    /// Link two existing nodes, identified by the key fields of the
    /// relationship's endpoint labels. Never creates duplicate edges.
    async fn merge_relationship(
        &self,
        rel_type: RelationshipType,
        from_key: &str,
        to_key: &str,
    ) -> Result<LinkOutcome, StoreError>;

    /// Check connectivity
    async fn health_check(&self) -> Result<bool, StoreError>;
}
