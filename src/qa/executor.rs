//! Read-only execution of validated queries

use super::error::QaError;
use crate::neo4j::{GraphStore, Record};
use std::sync::Arc;
use std::time::Duration;

pub struct QueryExecutor {
    store: Arc<dyn GraphStore>,
    timeout: Duration,
    max_rows: usize,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn GraphStore>, timeout: Duration, max_rows: usize) -> Self {
        Self {
            store,
            timeout,
            max_rows,
        }
    }

    /// Run `cypher` against the graph, bounded by the configured timeout.
    ///
    /// Failures are reported once; nothing is retried here.
    pub async fn execute(&self, cypher: &str) -> Result<Vec<Record>, QaError> {
        let started = std::time::Instant::now();
        let result =
            tokio::time::timeout(self.timeout, self.store.run_read_query(cypher, self.max_rows))
                .await;

        match result {
            Ok(Ok(records)) => {
                tracing::debug!(
                    rows = records.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Query executed"
                );
                Ok(records)
            }
            Ok(Err(e)) => {
                tracing::warn!(%cypher, error = %e, "Query execution failed");
                Err(e.into())
            }
            Err(_) => {
                tracing::warn!(%cypher, timeout_secs = self.timeout.as_secs_f64(), "Query timed out");
                Err(QaError::Timeout("graph query".to_string()))
            }
        }
    }
}
