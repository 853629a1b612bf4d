//! Batch load of the CSV data set into the graph

use super::mappings::{node_file, RelationshipSource, RELATIONSHIP_SOURCES};
use super::report::{IngestionReport, NodePassReport, RelationshipPassReport};
use super::source::{cell, CsvSource, Row};
use crate::neo4j::models::{LinkOutcome, NodeLabel, NodeWrite, NodeWriteMode, NodeWriteOutcome};
use crate::neo4j::GraphStore;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub struct IngestionPipeline {
    store: Arc<dyn GraphStore>,
    mode: NodeWriteMode,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn GraphStore>, mode: NodeWriteMode) -> Self {
        Self { store, mode }
    }

    /// Load every node file, then every relationship source, from `data_dir`.
    ///
    /// An unreadable file is recorded on its pass and the run moves on.
    pub async fn run(&self, data_dir: &Path) -> IngestionReport {
        let mut report = IngestionReport::start(self.mode);
        tracing::info!(data_dir = %data_dir.display(), mode = ?self.mode, "Starting ingestion");

        for label in NodeLabel::ALL {
            let file = node_file(label);
            let pass = match CsvSource::open(data_dir.join(file)).and_then(CsvSource::read_all) {
                Ok(rows) => self.ingest_nodes(label, &rows).await,
                Err(e) => {
                    tracing::error!(%label, error = %e, "Node source unreadable");
                    let mut pass = NodePassReport::new(label, file);
                    pass.error = Some(e.to_string());
                    pass
                }
            };
            report.nodes.push(pass);
        }

        for source in &RELATIONSHIP_SOURCES {
            let pass = match CsvSource::open(data_dir.join(source.file))
                .and_then(CsvSource::read_all)
            {
                Ok(rows) => self.ingest_relationships(source, &rows).await,
                Err(e) => {
                    tracing::error!(rel_type = %source.rel_type, error = %e, "Relationship source unreadable");
                    let mut pass = RelationshipPassReport::new(source.rel_type, source.file);
                    pass.error = Some(e.to_string());
                    pass
                }
            };
            report.relationships.push(pass);
        }

        report.finish();
        tracing::info!(
            nodes_written = report.nodes_written(),
            relationships_created = report.relationships_created(),
            "Ingestion finished"
        );
        report
    }

    /// Write one node per row
    pub async fn ingest_nodes(&self, label: NodeLabel, rows: &[Row]) -> NodePassReport {
        let mut pass = NodePassReport::new(label, node_file(label));
        let key_field = label.key_field();

        for (line, row) in rows.iter().enumerate() {
            pass.rows += 1;
            let Some(key) = cell(row, key_field) else {
                tracing::warn!(%label, row = line + 1, "Row has no {}; skipped", key_field);
                pass.skipped_missing_key += 1;
                continue;
            };

            let properties: BTreeMap<String, String> = label
                .attributes()
                .iter()
                .filter_map(|attr| cell(row, attr).map(|v| (attr.to_string(), v.to_string())))
                .collect();
            let complete = properties.len() == label.attributes().len();

            let node = NodeWrite {
                label,
                key: key.to_string(),
                properties,
            };
            match self.store.write_node(&node, self.mode).await {
                Ok(outcome) => {
                    match outcome {
                        NodeWriteOutcome::Created => pass.created += 1,
                        NodeWriteOutcome::Updated => pass.updated += 1,
                    }
                    if !complete {
                        tracing::debug!(%label, key, "Node written with missing attributes");
                        pass.incomplete += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(%label, key, error = %e, "Failed to write node");
                    pass.failed += 1;
                }
            }
        }

        tracing::info!(
            %label,
            rows = pass.rows,
            created = pass.created,
            updated = pass.updated,
            skipped = pass.skipped_missing_key,
            failed = pass.failed,
            "Node pass complete"
        );
        pass
    }

    /// Link endpoints named by each row; nodes are never created here
    pub async fn ingest_relationships(
        &self,
        source: &RelationshipSource,
        rows: &[Row],
    ) -> RelationshipPassReport {
        let rel_type = source.rel_type;
        let mut pass = RelationshipPassReport::new(rel_type, source.file);

        for (line, row) in rows.iter().enumerate() {
            pass.rows += 1;
            let (Some(from_key), Some(to_key)) =
                (cell(row, source.from_column), cell(row, source.to_column))
            else {
                tracing::debug!(%rel_type, row = line + 1, "Row lacks an endpoint key; skipped");
                pass.skipped_null_key += 1;
                continue;
            };

            match self.store.merge_relationship(rel_type, from_key, to_key).await {
                Ok(LinkOutcome::Created) => pass.created += 1,
                Ok(LinkOutcome::AlreadyLinked) => pass.already_linked += 1,
                Ok(LinkOutcome::MissingEndpoint) => {
                    tracing::warn!(%rel_type, from_key, to_key, "Endpoint not found; not linked");
                    pass.missing_endpoint += 1;
                }
                Err(e) => {
                    tracing::warn!(%rel_type, from_key, to_key, error = %e, "Failed to link");
                    pass.failed += 1;
                }
            }
        }

        tracing::info!(
            %rel_type,
            rows = pass.rows,
            created = pass.created,
            already_linked = pass.already_linked,
            missing_endpoint = pass.missing_endpoint,
            failed = pass.failed,
            "Relationship pass complete"
        );
        pass
    }
}
