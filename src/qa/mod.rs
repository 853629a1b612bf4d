//! Question answering: question → Cypher → records → answer
//!
//! - `translator`: asks the completion service for a query and validates it
//! - `executor`: runs the query read-only with a timeout and a row cap
//! - `humanizer`: turns records into an English answer, never failing
//! - `pipeline`: wires the three stages for one request

pub mod error;
pub mod executor;
pub mod humanizer;
pub mod pipeline;
pub mod translator;

pub use error::QaError;
pub use executor::QueryExecutor;
pub use humanizer::{HumanizedAnswer, ResultHumanizer};
pub use pipeline::{AskResponse, QaPipeline, QaSettings};
pub use translator::QueryTranslator;
