use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::{DeleteMessageBatchRequestEntry, MessageSystemAttributeName};
use aws_sdk_sqs::Client as SqsClient;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{Config, MAX_BATCH_SIZE};
use crate::error::{Result, WorkerError};
use crate::models::QueueMessage;
use crate::services::batch_processor::{BatchProcessor, BatchReport};

const RECEIVE_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Source of delivered batches.
///
/// Messages that are not acknowledged become visible again after the queue's
/// visibility timeout; the queue's redrive policy dead-letters them once its
/// retry limit is reached.
#[async_trait]
pub trait QueueSource: Send + Sync {
    async fn receive(&self) -> Result<Vec<QueueMessage>>;

    /// Remove messages whose records are durably written
    async fn acknowledge(&self, messages: &[QueueMessage]) -> Result<()>;
}

/// Long-polling SQS source
#[derive(Clone)]
pub struct SqsQueueSource {
    client: SqsClient,
    queue_url: String,
    max_messages: i32,
    wait_time_seconds: i32,
    visibility_timeout_seconds: i32,
}

impl SqsQueueSource {
    pub fn new(client: SqsClient, config: &Config) -> Self {
        Self {
            client,
            queue_url: config.queue_url.clone(),
            max_messages: config.worker_batch_size,
            wait_time_seconds: config.wait_time_seconds,
            visibility_timeout_seconds: config.visibility_timeout_seconds,
        }
    }
}

#[async_trait]
impl QueueSource for SqsQueueSource {
    async fn receive(&self) -> Result<Vec<QueueMessage>> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.max_messages)
            .wait_time_seconds(self.wait_time_seconds)
            .visibility_timeout(self.visibility_timeout_seconds)
            .message_system_attribute_names(MessageSystemAttributeName::ApproximateReceiveCount)
            .send()
            .await
            .map_err(|e| WorkerError::Queue(DisplayErrorContext(&e).to_string()))?;

        let mut messages = Vec::with_capacity(output.messages().len());
        for message in output.messages() {
            let (Some(message_id), Some(receipt_handle)) =
                (message.message_id(), message.receipt_handle())
            else {
                warn!("Skipping delivered message without id or receipt handle");
                continue;
            };

            let receive_count = message
                .attributes()
                .and_then(|attrs| attrs.get(&MessageSystemAttributeName::ApproximateReceiveCount))
                .and_then(|count| count.parse().ok());

            messages.push(QueueMessage {
                message_id: message_id.to_string(),
                receipt_handle: receipt_handle.to_string(),
                body: message.body().unwrap_or_default().to_string(),
                receive_count,
            });
        }

        Ok(messages)
    }

    async fn acknowledge(&self, messages: &[QueueMessage]) -> Result<()> {
        for chunk in messages.chunks(MAX_BATCH_SIZE as usize) {
            let entries = chunk
                .iter()
                .enumerate()
                .map(|(idx, message)| {
                    DeleteMessageBatchRequestEntry::builder()
                        .id(idx.to_string())
                        .receipt_handle(&message.receipt_handle)
                        .build()
                        .map_err(|e| WorkerError::Queue(e.to_string()))
                })
                .collect::<Result<Vec<_>>>()?;

            let output = self
                .client
                .delete_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| WorkerError::Queue(DisplayErrorContext(&e).to_string()))?;

            // Undeleted messages are redelivered and rewritten with the same key
            for failed in output.failed() {
                warn!(
                    entry_id = %failed.id(),
                    code = %failed.code(),
                    "Failed to acknowledge message; it will be redelivered"
                );
            }
        }

        Ok(())
    }
}

/// Receive, process, acknowledge loop
pub struct QueueConsumer<S: QueueSource> {
    source: Arc<S>,
    processor: BatchProcessor,
}

impl<S: QueueSource> QueueConsumer<S> {
    pub fn new(source: Arc<S>, processor: BatchProcessor) -> Self {
        Self { source, processor }
    }

    /// Process a delivered batch and acknowledge only the messages that
    /// were persisted. Failed messages are left for redelivery.
    pub async fn handle_delivery(&self, messages: Vec<QueueMessage>) -> BatchReport {
        if messages.is_empty() {
            return BatchReport::default();
        }

        let report = self.processor.process_batch(&messages).await;

        let processed: HashSet<&str> = report.processed_ids().collect();
        let to_ack: Vec<QueueMessage> = messages
            .into_iter()
            .filter(|m| processed.contains(m.message_id.as_str()))
            .collect();

        if !to_ack.is_empty() {
            if let Err(e) = self.source.acknowledge(&to_ack).await {
                // Records are already written; redelivery overwrites them
                error!(error = %e, count = to_ack.len(), "Failed to acknowledge processed messages");
            }
        }

        report
    }

    pub async fn poll_once(&self) -> Result<BatchReport> {
        let messages = self.source.receive().await?;
        Ok(self.handle_delivery(messages).await)
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// Shutdown only interrupts a pending receive; a batch already being
    /// processed is finished and acknowledged first.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Starting queue consumer loop");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let received = tokio::select! {
                _ = shutdown.changed() => break,
                received = self.source.receive() => received,
            };

            match received {
                Ok(messages) => {
                    if messages.is_empty() {
                        debug!("No messages received");
                        continue;
                    }
                    self.handle_delivery(messages).await;
                }
                Err(e) => {
                    error!(error = %e, "Queue receive failed");
                    tokio::time::sleep(RECEIVE_ERROR_BACKOFF).await;
                }
            }
        }

        info!("Queue consumer stopped");
    }
}
