use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log_event::EventError;
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Ingestion failures.
///
/// Client input errors render as 400 (413 for oversized bodies) with their
/// reason; everything else is a 500 with a generic body so queue internals
/// never leak to callers.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported Content-Type")]
    UnsupportedContentType,

    #[error("Invalid JSON")]
    InvalidJson(String),

    #[error("Invalid text encoding")]
    InvalidEncoding,

    #[error("Missing tenant_id")]
    MissingTenantId,

    #[error("Missing text content")]
    MissingText,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// Body stream broke off before it was fully read
    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] EventError),
}

impl IngestError {
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::UnsupportedContentType
                | IngestError::InvalidJson(_)
                | IngestError::InvalidEncoding
                | IngestError::MissingTenantId
                | IngestError::MissingText
                | IngestError::PayloadTooLarge
                | IngestError::InvalidBody(_)
        )
    }

    /// Machine-readable reason returned in the `error` field
    pub fn reason(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Internal server error".to_string()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ResponseError for IngestError {
    fn status_code(&self) -> StatusCode {
        match self {
            IngestError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.reason(),
        })
    }
}
