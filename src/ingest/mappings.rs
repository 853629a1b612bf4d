//! Which file feeds which label, and which columns feed which relationship

use crate::neo4j::models::{NodeLabel, RelationshipType};

/// Source file of a label's nodes
pub fn node_file(label: NodeLabel) -> &'static str {
    match label {
        NodeLabel::User => "users.csv",
        NodeLabel::Project => "projects.csv",
        NodeLabel::Issue => "issues.csv",
        NodeLabel::Commit => "commits.csv",
        NodeLabel::Status => "status.csv",
        NodeLabel::LastUpdated => "lastupdated.csv",
        NodeLabel::Metadata => "metadata.csv",
    }
}

/// Where the endpoints of one relationship type are read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipSource {
    pub rel_type: RelationshipType,
    pub file: &'static str,
    /// Column holding the key of the `from` endpoint
    pub from_column: &'static str,
    /// Column holding the key of the `to` endpoint
    pub to_column: &'static str,
}

/// Relationship passes, in ingestion order
pub const RELATIONSHIP_SOURCES: [RelationshipSource; 7] = [
    RelationshipSource {
        rel_type: RelationshipType::Made,
        file: "commits.csv",
        from_column: "author_id",
        to_column: "commit_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::Addresses,
        file: "commits.csv",
        from_column: "commit_id",
        to_column: "issue_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::BelongsTo,
        file: "issues.csv",
        from_column: "issue_id",
        to_column: "project_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::HasStatus,
        file: "issues.csv",
        from_column: "issue_id",
        to_column: "status_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::TrackedBy,
        file: "lastupdated.csv",
        from_column: "issue_id",
        to_column: "update_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::HasMetadata,
        file: "metadata.csv",
        from_column: "issue_id",
        to_column: "metadata_id",
    },
    RelationshipSource {
        rel_type: RelationshipType::ManagedBy,
        file: "projects.csv",
        from_column: "project_id",
        to_column: "user_id",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_relationship_has_one_source() {
        for rel in RelationshipType::ALL {
            assert_eq!(
                RELATIONSHIP_SOURCES
                    .iter()
                    .filter(|s| s.rel_type == rel)
                    .count(),
                1,
                "{}",
                rel
            );
        }
    }

    #[test]
    fn test_to_column_is_the_target_key() {
        for source in RELATIONSHIP_SOURCES {
            assert_eq!(source.to_column, source.rel_type.to_label().key_field());
        }
    }
}
