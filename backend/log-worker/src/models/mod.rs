//! Queue-facing types for the worker
use serde::{Deserialize, Serialize};

/// A message as delivered by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Identifier used to report this message as failed
    pub message_id: String,

    /// Token needed to acknowledge (delete) this delivery
    pub receipt_handle: String,

    pub body: String,

    /// How many times the queue has delivered this message, if known
    pub receive_count: Option<u32>,
}

impl QueueMessage {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        let message_id = message_id.into();
        Self {
            receipt_handle: message_id.clone(),
            message_id,
            body: body.into(),
            receive_count: None,
        }
    }
}

/// Outcome of processing one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Record durably written
    Processed,

    /// Not written; must be redelivered
    Failed(String),
}

impl MessageOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, MessageOutcome::Failed(_))
    }
}

/// Partial-batch-failure entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemFailure {
    pub item_identifier: String,
}

/// Partial-batch-failure response: only the listed items are redelivered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub batch_item_failures: Vec<BatchItemFailure>,
}

impl BatchResponse {
    pub fn failed_ids(&self) -> Vec<&str> {
        self.batch_item_failures
            .iter()
            .map(|f| f.item_identifier.as_str())
            .collect()
    }
}
