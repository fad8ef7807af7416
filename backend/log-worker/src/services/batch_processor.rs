use futures::{stream, FutureExt, StreamExt};
use log_event::{LogEvent, ProcessedRecord};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::metrics;
use crate::models::{BatchItemFailure, BatchResponse, MessageOutcome, QueueMessage};
use crate::services::cost::CostModel;
use crate::services::record_writer::RecordWriter;
use crate::services::redactor::redact;

/// Per-message outcomes for one delivered batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<(String, MessageOutcome)>,
}

impl BatchReport {
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(id, _)| id.as_str())
    }

    pub fn processed_ids(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_failed())
            .map(|(id, _)| id.as_str())
    }

    pub fn failed_count(&self) -> usize {
        self.failed_ids().count()
    }

    /// Fold the outcomes into a partial-batch-failure response
    pub fn to_response(&self) -> BatchResponse {
        BatchResponse {
            batch_item_failures: self
                .failed_ids()
                .map(|id| BatchItemFailure {
                    item_identifier: id.to_string(),
                })
                .collect(),
        }
    }
}

/// Processes delivered batches one message at a time, isolating failures.
///
/// Each message is decoded, charged its simulated cost, redacted and
/// persisted. A failure at any step marks only that message as failed.
#[derive(Clone)]
pub struct BatchProcessor {
    writer: RecordWriter,
    cost: Arc<dyn CostModel>,
    concurrency: usize,
}

impl BatchProcessor {
    pub fn new(writer: RecordWriter, cost: Arc<dyn CostModel>, concurrency: usize) -> Self {
        Self {
            writer,
            cost,
            concurrency: concurrency.max(1),
        }
    }

    /// Process a single message through to a persisted record
    pub async fn process_message(&self, message: &QueueMessage) -> Result<ProcessedRecord> {
        let event = LogEvent::from_message_body(&message.body)?;

        info!(
            message_id = %message.message_id,
            tenant_id = %event.tenant_id,
            log_id = %event.log_id,
            text_length = event.original_text.len(),
            "Processing message"
        );

        let delay = self.cost.delay_for(&event.original_text);
        if !delay.is_zero() {
            debug!(message_id = %message.message_id, delay_ms = delay.as_millis() as u64, "Simulating processing cost");
            tokio::time::sleep(delay).await;
        }

        let modified_data = redact(&event.original_text);
        self.writer.write(&event, modified_data).await
    }

    /// Process every message in the batch and report per-message outcomes.
    ///
    /// Never fails as a whole: errors and panics are confined to the message
    /// that raised them.
    pub async fn process_batch(&self, messages: &[QueueMessage]) -> BatchReport {
        let tasks: Vec<_> = messages
            .iter()
            .map(|message| async move {
                let result = AssertUnwindSafe(self.process_message(message))
                    .catch_unwind()
                    .await;

                let outcome = match result {
                    Ok(Ok(_)) => MessageOutcome::Processed,
                    Ok(Err(e)) => {
                        error!(
                            message_id = %message.message_id,
                            receive_count = ?message.receive_count,
                            transient = e.is_transient(),
                            error = %e,
                            "Processing failed"
                        );
                        MessageOutcome::Failed(e.to_string())
                    }
                    Err(_) => {
                        error!(message_id = %message.message_id, "Processing panicked");
                        MessageOutcome::Failed("processing panicked".to_string())
                    }
                };

                (message.message_id.clone(), outcome)
            })
            .collect();

        let outcomes: Vec<(String, MessageOutcome)> = stream::iter(tasks)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let report = BatchReport { outcomes };
        metrics::record_batch(messages.len() - report.failed_count(), report.failed_count());

        info!(
            batch_size = messages.len(),
            failed = report.failed_count(),
            "Batch processed"
        );

        report
    }

    /// Partial-batch-failure entry point
    pub async fn handle(&self, messages: &[QueueMessage]) -> BatchResponse {
        self.process_batch(messages).await.to_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryRecordStore, NoCost};

    fn processor(store: Arc<InMemoryRecordStore>) -> BatchProcessor {
        BatchProcessor::new(RecordWriter::new(store), Arc::new(NoCost), 4)
    }

    fn message(id: &str, tenant: &str, log_id: &str, text: &str) -> QueueMessage {
        let body = serde_json::json!({
            "tenant_id": tenant,
            "log_id": log_id,
            "original_text": text,
            "source": "json_upload"
        });
        QueueMessage::new(id, body.to_string())
    }

    #[tokio::test]
    async fn test_process_message_redacts_and_persists() {
        let store = Arc::new(InMemoryRecordStore::new());
        let record = processor(store.clone())
            .process_message(&message(
                "m1",
                "acme_corp",
                "101",
                "User 800-555-0199 logged in from 192.168.1.1",
            ))
            .await
            .unwrap();

        assert_eq!(
            record.modified_data,
            "User [REDACTED] logged in from 192.168.1.1"
        );
        assert_eq!(
            record.original_text,
            "User 800-555-0199 logged in from 192.168.1.1"
        );
        assert_eq!(store.get("acme_corp", "101"), Some(record));
    }

    #[tokio::test]
    async fn test_malformed_message_isolated() {
        let store = Arc::new(InMemoryRecordStore::new());
        let batch = vec![
            message("m1", "acme_corp", "1", "first"),
            QueueMessage::new("m2", "{not an event"),
            message("m3", "acme_corp", "3", "third"),
        ];

        let report = processor(store.clone()).process_batch(&batch).await;

        assert_eq!(report.failed_ids().collect::<Vec<_>>(), vec!["m2"]);
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(store.len(), 2);
        assert!(store.get("acme_corp", "1").is_some());
        assert!(store.get("acme_corp", "3").is_some());
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = Arc::new(InMemoryRecordStore::new());
        let response = processor(store).handle(&[]).await;
        assert!(response.batch_item_failures.is_empty());
    }

    #[test]
    fn test_report_fold() {
        let report = BatchReport {
            outcomes: vec![
                ("a".into(), MessageOutcome::Processed),
                ("b".into(), MessageOutcome::Failed("boom".into())),
                ("c".into(), MessageOutcome::Processed),
            ],
        };

        assert_eq!(report.to_response().failed_ids(), vec!["b"]);
        assert_eq!(report.processed_ids().collect::<Vec<_>>(), vec!["a", "c"]);
    }
}
