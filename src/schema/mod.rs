//! Graph schema knowledge: the static catalog and the query validator

pub mod catalog;
pub mod validator;

pub use catalog::{SchemaCatalog, SCHEMA_VERSION};
pub use validator::{CypherValidator, QueryReferences, SchemaViolation};
