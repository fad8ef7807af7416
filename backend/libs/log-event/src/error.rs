//! Error types for the log event schema

use thiserror::Error;

pub type EventResult<T> = Result<T, EventError>;

#[derive(Error, Debug)]
pub enum EventError {
    /// Payload is not a well-formed event
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Required field present but empty
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
