//! `GraphStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::{GraphStore, StoreError};

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn run_read_query(
        &self,
        cypher: &str,
        max_rows: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.run_read_query(cypher, max_rows).await
    }

    async fn write_node(
        &self,
        node: &NodeWrite,
        mode: NodeWriteMode,
    ) -> Result<NodeWriteOutcome, StoreError> {
        self.write_node(node, mode).await
    }

    async fn merge_relationship(
        &self,
        rel_type: RelationshipType,
        from_key: &str,
        to_key: &str,
    ) -> Result<LinkOutcome, StoreError> {
        self.merge_relationship(rel_type, from_key, to_key).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        self.health_check().await
    }
}
