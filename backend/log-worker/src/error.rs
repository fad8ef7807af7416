use log_event::EventError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Per-message and per-batch failures in the worker.
///
/// None of these are fatal to the process; each is reported against the
/// message that caused it and left to the queue's redelivery policy.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Message body is not a valid event
    #[error("Invalid message payload: {0}")]
    InvalidPayload(#[from] EventError),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl WorkerError {
    /// Transient infrastructure faults; redelivery may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, WorkerError::Store(_) | WorkerError::Queue(_))
    }
}
