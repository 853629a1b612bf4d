//! Graph models for the issue-tracking knowledge graph
//!
//! Node labels and relationship types are closed enumerations. They are the
//! only values ever interpolated into Cypher text; everything that comes from
//! a data file or a user travels as a query parameter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single result row, keyed by the alias bound in the RETURN clause.
pub type Record = serde_json::Map<String, serde_json::Value>;

// ============================================================================
// Node labels
// ============================================================================

/// Every node label the graph may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeLabel {
    User,
    Project,
    Issue,
    Commit,
    Status,
    LastUpdated,
    Metadata,
}

impl NodeLabel {
    /// All labels, in node-ingestion order.
    pub const ALL: [NodeLabel; 7] = [
        NodeLabel::User,
        NodeLabel::Project,
        NodeLabel::Issue,
        NodeLabel::Status,
        NodeLabel::LastUpdated,
        NodeLabel::Metadata,
        NodeLabel::Commit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::User => "User",
            NodeLabel::Project => "Project",
            NodeLabel::Issue => "Issue",
            NodeLabel::Commit => "Commit",
            NodeLabel::Status => "Status",
            NodeLabel::LastUpdated => "LastUpdated",
            NodeLabel::Metadata => "Metadata",
        }
    }

    /// Property holding the stable identifier for this label
    pub fn key_field(&self) -> &'static str {
        match self {
            NodeLabel::User => "user_id",
            NodeLabel::Project => "project_id",
            NodeLabel::Issue => "issue_id",
            NodeLabel::Commit => "commit_id",
            NodeLabel::Status => "status_id",
            NodeLabel::LastUpdated => "update_id",
            NodeLabel::Metadata => "metadata_id",
        }
    }

    /// Non-key properties every node of this label carries
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            NodeLabel::User => &["name", "email", "role"],
            NodeLabel::Project => &["project_name", "description"],
            NodeLabel::Issue => &["title", "priority", "project_id"],
            NodeLabel::Commit => &["message", "author_id", "issue_id"],
            NodeLabel::Status => &["status_name"],
            NodeLabel::LastUpdated => &["issue_id", "last_updated"],
            NodeLabel::Metadata => &["issue_id", "labels", "created_by", "priority"],
        }
    }

    /// Parse an exact (case-sensitive) label name
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|label| label.as_str() == s)
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Relationship types
// ============================================================================

/// Every directed relationship type the graph may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    Made,
    Addresses,
    BelongsTo,
    HasStatus,
    TrackedBy,
    HasMetadata,
    ManagedBy,
}

impl RelationshipType {
    pub const ALL: [RelationshipType; 7] = [
        RelationshipType::Made,
        RelationshipType::Addresses,
        RelationshipType::BelongsTo,
        RelationshipType::HasStatus,
        RelationshipType::TrackedBy,
        RelationshipType::HasMetadata,
        RelationshipType::ManagedBy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Made => "MADE",
            RelationshipType::Addresses => "ADDRESSES",
            RelationshipType::BelongsTo => "BELONGS_TO",
            RelationshipType::HasStatus => "HAS_STATUS",
            RelationshipType::TrackedBy => "TRACKED_BY",
            RelationshipType::HasMetadata => "HAS_METADATA",
            RelationshipType::ManagedBy => "MANAGED_BY",
        }
    }

    /// Label of the start node
    pub fn from_label(&self) -> NodeLabel {
        match self {
            RelationshipType::Made => NodeLabel::User,
            RelationshipType::Addresses => NodeLabel::Commit,
            RelationshipType::BelongsTo
            | RelationshipType::HasStatus
            | RelationshipType::TrackedBy
            | RelationshipType::HasMetadata => NodeLabel::Issue,
            RelationshipType::ManagedBy => NodeLabel::Project,
        }
    }

    /// Label of the end node
    pub fn to_label(&self) -> NodeLabel {
        match self {
            RelationshipType::Made => NodeLabel::Commit,
            RelationshipType::Addresses => NodeLabel::Issue,
            RelationshipType::BelongsTo => NodeLabel::Project,
            RelationshipType::HasStatus => NodeLabel::Status,
            RelationshipType::TrackedBy => NodeLabel::LastUpdated,
            RelationshipType::HasMetadata => NodeLabel::Metadata,
            RelationshipType::ManagedBy => NodeLabel::User,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rel| rel.as_str() == s)
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Write requests and outcomes
// ============================================================================

/// How node rows are written during ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeWriteMode {
    /// MERGE on the key property, then overwrite the remaining properties
    #[default]
    Merge,
    /// CREATE a fresh node for every row (re-runs produce duplicates)
    Append,
}

impl std::str::FromStr for NodeWriteMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(NodeWriteMode::Merge),
            "append" | "create" => Ok(NodeWriteMode::Append),
            other => Err(format!(
                "unknown node write mode '{}' (expected 'merge' or 'append')",
                other
            )),
        }
    }
}

/// A node to be written, keyed by its label's key field
#[derive(Debug, Clone, PartialEq)]
pub struct NodeWrite {
    pub label: NodeLabel,
    pub key: String,
    /// Non-key properties that are present in the source row
    pub properties: BTreeMap<String, String>,
}

/// Result of writing a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeWriteOutcome {
    Created,
    Updated,
}

/// Result of linking two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Created,
    AlreadyLinked,
    /// One of the endpoints does not exist; nothing was written
    MissingEndpoint,
}
