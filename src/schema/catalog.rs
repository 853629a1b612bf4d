//! Static schema catalog
//!
//! The only description of the graph that is ever handed to the completion
//! service, and the reference the validator checks generated queries against.
//! It changes only with a new release; there is no runtime registration.

use crate::neo4j::models::{NodeLabel, RelationshipType};
use serde::Serialize;

/// Bumped whenever labels, relationships or examples change
pub const SCHEMA_VERSION: &str = "2024.1";

/// A worked example shown to the model: question and the expected query shape
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueryExample {
    pub question: &'static str,
    pub cypher: &'static str,
}

const EXAMPLES: [QueryExample; 3] = [
    QueryExample {
        question: "Which project is Yara Kim working on?",
        cypher: "MATCH (u:User {name:'Yara Kim'})-[:MADE]->(:Commit)-[:ADDRESSES]->(i:Issue)-[:BELONGS_TO]->(p:Project) RETURN p;",
    },
    QueryExample {
        question: "What is the status of Issue I1?",
        cypher: "MATCH (i:Issue {issue_id:'I1'})-[:HAS_STATUS]->(s:Status) RETURN s;",
    },
    QueryExample {
        question: "Who made commit C1?",
        cypher: "MATCH (c:Commit {commit_id:'C1'})<-[:MADE]-(u:User) RETURN u;",
    },
];

/// Serializable view of a label, for the `/schema` endpoint
#[derive(Debug, Clone, Serialize)]
pub struct LabelDescription {
    pub label: &'static str,
    pub key: &'static str,
    pub attributes: Vec<&'static str>,
}

/// Serializable view of a relationship type
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipDescription {
    #[serde(rename = "type")]
    pub rel_type: &'static str,
    pub from: &'static str,
    pub to: &'static str,
}

/// Complete catalog snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDescription {
    pub version: &'static str,
    pub labels: Vec<LabelDescription>,
    pub relationships: Vec<RelationshipDescription>,
    pub examples: Vec<QueryExample>,
}

/// The schema of the issue-tracking graph
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaCatalog;

impl SchemaCatalog {
    pub fn standard() -> Self {
        SchemaCatalog
    }

    pub fn version(&self) -> &'static str {
        SCHEMA_VERSION
    }

    pub fn labels(&self) -> &'static [NodeLabel] {
        &NodeLabel::ALL
    }

    pub fn relationships(&self) -> &'static [RelationshipType] {
        &RelationshipType::ALL
    }

    pub fn examples(&self) -> &'static [QueryExample] {
        &EXAMPLES
    }

    pub fn label(&self, name: &str) -> Option<NodeLabel> {
        NodeLabel::parse(name)
    }

    pub fn relationship(&self, name: &str) -> Option<RelationshipType> {
        RelationshipType::parse(name)
    }

    /// Render the text block injected into the translation prompt
    pub fn describe(&self) -> String {
        let mut out = String::from("Graph Entities:\n");
        for label in self.labels() {
            let fields: Vec<&str> = std::iter::once(label.key_field())
                .chain(label.attributes().iter().copied())
                .collect();
            out.push_str(&format!("- {}({})\n", label.as_str(), fields.join(", ")));
        }

        out.push_str("\nRelationships (directed):\n");
        for rel in self.relationships() {
            out.push_str(&format!(
                "- {}-{}->{}\n",
                rel.from_label(),
                rel.as_str(),
                rel.to_label()
            ));
        }

        out.push_str("\nExample Queries:\n");
        for (i, example) in self.examples().iter().enumerate() {
            out.push_str(&format!(
                "{}. {}\n{}\n\n",
                i + 1,
                example.question,
                example.cypher
            ));
        }

        out.trim_end().to_string()
    }

    pub fn description(&self) -> CatalogDescription {
        CatalogDescription {
            version: SCHEMA_VERSION,
            labels: self
                .labels()
                .iter()
                .map(|label| LabelDescription {
                    label: label.as_str(),
                    key: label.key_field(),
                    attributes: label.attributes().to_vec(),
                })
                .collect(),
            relationships: self
                .relationships()
                .iter()
                .map(|rel| RelationshipDescription {
                    rel_type: rel.as_str(),
                    from: rel.from_label().as_str(),
                    to: rel.to_label().as_str(),
                })
                .collect(),
            examples: EXAMPLES.to_vec(),
        }
    }
}
