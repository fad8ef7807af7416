use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::Client as SqsClient;
use log_event::LogEvent;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{IngestError, Result};

/// Destination queue for normalized events.
///
/// Implementations must either durably accept the event or return an error;
/// an event is never dropped silently.
#[async_trait]
pub trait EventQueue: Send + Sync {
    async fn send(&self, event: &LogEvent) -> Result<()>;
}

/// SQS-backed queue. The client is built once per process and shared.
#[derive(Clone)]
pub struct SqsEventQueue {
    client: SqsClient,
    queue_url: String,
}

impl SqsEventQueue {
    pub fn new(client: SqsClient, queue_url: impl Into<String>) -> Self {
        Self {
            client,
            queue_url: queue_url.into(),
        }
    }
}

#[async_trait]
impl EventQueue for SqsEventQueue {
    async fn send(&self, event: &LogEvent) -> Result<()> {
        let body = event.to_message_body()?;

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(body)
            .send()
            .await
            .map_err(|e| IngestError::Queue(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            message_id = output.message_id().unwrap_or_default(),
            log_id = %event.log_id,
            "Message sent to queue"
        );

        Ok(())
    }
}

/// Body of a `202 Accepted` response. Carries no processing results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedResponse {
    pub status: String,
    pub log_id: String,
    pub tenant_id: String,
    pub message: String,
}

impl AcceptedResponse {
    pub fn for_event(event: &LogEvent) -> Self {
        Self {
            status: "accepted".to_string(),
            log_id: event.log_id.clone(),
            tenant_id: event.tenant_id.clone(),
            message: "Processing queued".to_string(),
        }
    }
}

/// Hands validated events to the queue, once per request
#[derive(Clone)]
pub struct Enqueuer {
    queue: Arc<dyn EventQueue>,
}

impl Enqueuer {
    pub fn new(queue: Arc<dyn EventQueue>) -> Self {
        Self { queue }
    }

    pub async fn enqueue(&self, event: &LogEvent) -> Result<AcceptedResponse> {
        if let Err(e) = self.queue.send(event).await {
            error!(
                tenant_id = %event.tenant_id,
                log_id = %event.log_id,
                error = %e,
                "Failed to enqueue message"
            );
            return Err(e);
        }

        info!(
            tenant_id = %event.tenant_id,
            log_id = %event.log_id,
            source = %event.source,
            text_length = event.original_text.len(),
            "Log accepted for processing"
        );

        Ok(AcceptedResponse::for_event(event))
    }
}
