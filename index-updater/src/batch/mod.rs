//! Batch processing of trigger records against a sink.
//!
//! Records are chunked by the configured batch size; each chunk's
//! successfully built documents are submitted as one add operation, and a
//! single commit is issued after the last chunk. The per-record failure
//! policy follows `validate_before_update`: fail-fast aborts the whole
//! operation before the failing chunk is submitted, tolerant mode skips
//! and logs failing records.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::builder::DocumentBuilder;
use crate::config::CollectionUpdateConfig;
use crate::errors::UpdateError;
use index_updater_repository::UpdateSink;

/// Failure of one record in tolerant mode.
#[derive(Debug)]
pub struct RecordFailure {
    /// Zero-based index of the record in the input sequence.
    pub index: usize,
    /// The build error.
    pub error: UpdateError,
}

/// Outcome of one collection update operation.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Number of trigger records in the input.
    pub total: usize,
    /// Number of documents built and submitted.
    pub succeeded: usize,
    /// Records skipped in tolerant mode, with their errors.
    pub failures: Vec<RecordFailure>,
}

impl UpdateReport {
    /// Number of records skipped.
    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

/// Processes trigger records into committed update documents.
pub struct BatchProcessor {
    builder: DocumentBuilder,
    sink: Arc<dyn UpdateSink>,
}

impl BatchProcessor {
    /// Create a processor with the given builder and sink.
    pub fn new(builder: DocumentBuilder, sink: Arc<dyn UpdateSink>) -> Self {
        Self { builder, sink }
    }

    /// Process all trigger records for one collection.
    ///
    /// Returns the report, or an error when the operation aborted
    /// (fail-fast record failure, or a sink failure).
    #[instrument(skip(self, config, records), fields(collection = %config.collection_name, record_count = records.len()))]
    pub async fn process(
        &self,
        config: &CollectionUpdateConfig,
        records: &[Value],
    ) -> Result<UpdateReport, UpdateError> {
        let batch_size = config.batch_size.max(1);
        let mut report = UpdateReport {
            total: records.len(),
            ..UpdateReport::default()
        };

        for (chunk_index, chunk) in records.chunks(batch_size).enumerate() {
            let mut documents = Vec::with_capacity(chunk.len());

            for (offset, record) in chunk.iter().enumerate() {
                let index = chunk_index * batch_size + offset;
                match self.builder.build(config, record).await {
                    Ok(document) => {
                        documents.push(document);
                        report.succeeded += 1;
                    }
                    Err(build_error) => {
                        if config.validate_before_update {
                            error!(
                                record_index = index,
                                error = %build_error,
                                "Record failed; aborting batch"
                            );
                            return Err(UpdateError::Aborted {
                                index,
                                succeeded: report.succeeded,
                                source: Box::new(build_error),
                            });
                        }
                        warn!(
                            record_index = index,
                            error = %build_error,
                            "Skipping record after build failure"
                        );
                        report.failures.push(RecordFailure {
                            index,
                            error: build_error,
                        });
                    }
                }
            }

            if !documents.is_empty() {
                self.sink.add(&config.collection_name, &documents).await?;
                debug!(
                    chunk = chunk_index,
                    submitted = documents.len(),
                    "Submitted chunk to sink"
                );
            }
        }

        self.sink.commit(&config.collection_name).await?;

        info!(
            total = report.total,
            succeeded = report.succeeded,
            skipped = report.skipped(),
            "Processed collection update"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResultCache;
    use crate::provider::ProviderRegistry;
    use crate::executor::DataSourceExecutor;
    use crate::transform::TransformationRegistry;
    use index_updater_repository::MemorySink;
    use serde_json::json;

    fn processor(sink: Arc<MemorySink>) -> BatchProcessor {
        let executor = DataSourceExecutor::new(
            Arc::new(ProviderRegistry::new()),
            Arc::new(ResultCache::new()),
        );
        let builder =
            DocumentBuilder::new(executor, Arc::new(TransformationRegistry::with_defaults()));
        BatchProcessor::new(builder, sink)
    }

    fn config(validate: bool, batch_size: usize) -> CollectionUpdateConfig {
        let yaml = format!(
            r#"
collection_name: orders
validate_before_update: {validate}
batch_size: {batch_size}
identifier:
  parts:
    - field: orderId
      trigger_path: orderId
field_mappings:
  - field: status
    trigger_path: status
    required: true
"#
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    fn records() -> Vec<Value> {
        vec![
            json!({"orderId": "O1", "status": "NEW"}),
            json!({"orderId": "O2"}), // missing required status
            json!({"orderId": "O3", "status": "SHIPPED"}),
        ]
    }

    #[tokio::test]
    async fn test_fail_fast_submits_nothing() {
        let sink = Arc::new(MemorySink::new());
        let processor = processor(sink.clone());

        let error = processor
            .process(&config(true, 10), &records())
            .await
            .unwrap_err();

        match error {
            UpdateError::Aborted {
                index, succeeded, ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(succeeded, 1);
            }
            other => panic!("expected abort, got {other:?}"),
        }
        assert_eq!(sink.pending_count("orders"), 0);
        assert!(sink.committed_documents("orders").is_empty());
        assert_eq!(sink.commit_count("orders"), 0);
    }

    #[tokio::test]
    async fn test_tolerant_mode_skips_and_commits_rest() {
        let sink = Arc::new(MemorySink::new());
        let processor = processor(sink.clone());

        let report = processor
            .process(&config(false, 10), &records())
            .await
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failures[0].index, 1);

        let committed = sink.committed_documents("orders");
        let ids: Vec<&str> = committed.iter().map(|doc| doc.id()).collect();
        assert_eq!(ids, vec!["O1", "O3"]);
        assert_eq!(sink.commit_count("orders"), 1);
    }

    #[tokio::test]
    async fn test_chunked_submission_single_commit() {
        let sink = Arc::new(MemorySink::new());
        let processor = processor(sink.clone());
        let records: Vec<Value> = (0..5)
            .map(|i| json!({"orderId": format!("O{i}"), "status": "NEW"}))
            .collect();

        let report = processor.process(&config(true, 2), &records).await.unwrap();

        assert_eq!(report.succeeded, 5);
        assert_eq!(sink.committed_documents("orders").len(), 5);
        assert_eq!(sink.commit_count("orders"), 1);
    }

    #[tokio::test]
    async fn test_empty_input_still_commits_once() {
        let sink = Arc::new(MemorySink::new());
        let processor = processor(sink.clone());

        let report = processor.process(&config(true, 2), &[]).await.unwrap();

        assert_eq!(report.total, 0);
        assert_eq!(sink.commit_count("orders"), 1);
    }
}
