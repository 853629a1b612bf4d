//! Counters produced by an ingestion run

use crate::neo4j::models::{NodeLabel, NodeWriteMode, RelationshipType};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one node pass (one label, one file)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodePassReport {
    pub label: NodeLabel,
    pub source: String,
    pub rows: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped_missing_key: usize,
    /// Written, but with one or more attributes absent
    pub incomplete: usize,
    pub failed: usize,
    /// Set when the source could not be read at all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NodePassReport {
    pub fn new(label: NodeLabel, source: impl Into<String>) -> Self {
        Self {
            label,
            source: source.into(),
            rows: 0,
            created: 0,
            updated: 0,
            skipped_missing_key: 0,
            incomplete: 0,
            failed: 0,
            error: None,
        }
    }
}

/// Outcome of one relationship pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPassReport {
    pub rel_type: RelationshipType,
    pub source: String,
    pub rows: usize,
    pub created: usize,
    pub already_linked: usize,
    pub skipped_null_key: usize,
    pub missing_endpoint: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelationshipPassReport {
    pub fn new(rel_type: RelationshipType, source: impl Into<String>) -> Self {
        Self {
            rel_type,
            source: source.into(),
            rows: 0,
            created: 0,
            already_linked: 0,
            skipped_null_key: 0,
            missing_endpoint: 0,
            failed: 0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionReport {
    pub mode: NodeWriteMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub nodes: Vec<NodePassReport>,
    pub relationships: Vec<RelationshipPassReport>,
}

impl IngestionReport {
    pub fn start(mode: NodeWriteMode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            finished_at: None,
            nodes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn nodes_written(&self) -> usize {
        self.nodes.iter().map(|n| n.created + n.updated).sum()
    }

    pub fn relationships_created(&self) -> usize {
        self.relationships.iter().map(|r| r.created).sum()
    }

    /// Whether any source was unreadable or any write failed
    pub fn has_failures(&self) -> bool {
        self.nodes.iter().any(|n| n.error.is_some() || n.failed > 0)
            || self
                .relationships
                .iter()
                .any(|r| r.error.is_some() || r.failed > 0)
    }
}
