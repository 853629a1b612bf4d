//! CSV ingestion into the graph
//!
//! All node files are loaded first (fixed label order), then every
//! relationship source. Relationship passes only link existing nodes.

pub mod mappings;
pub mod pipeline;
pub mod report;
pub mod source;

pub use pipeline::IngestionPipeline;
pub use report::{IngestionReport, NodePassReport, RelationshipPassReport};
pub use source::{CsvSource, Row, SourceError};
