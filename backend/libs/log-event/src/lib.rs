//! Canonical log event schema shared by the ingest service and the log worker.
//!
//! The ingest side produces [`LogEvent`]s and places them on the queue using
//! [`LogEvent::to_message_body`]. The worker decodes them with
//! [`LogEvent::from_message_body`] and persists a [`ProcessedRecord`].
//!
//! Queue wire format:
//!
//! ```json
//! {
//!   "tenant_id": "acme_corp",
//!   "log_id": "101",
//!   "original_text": "User 800-555-0199 logged in",
//!   "source": "json_upload"
//! }
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod error;

pub use error::{EventError, EventResult};

/// Which ingestion path produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSource {
    JsonUpload,
    TextUpload,
}

impl LogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSource::JsonUpload => "json_upload",
            LogSource::TextUpload => "text_upload",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json_upload" => Some(LogSource::JsonUpload),
            "text_upload" => Some(LogSource::TextUpload),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized log submission.
///
/// Fields are set once by the ingest normalizer and are never modified
/// downstream; the worker only adds derived fields in [`ProcessedRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Isolation boundary, supplied by the caller
    pub tenant_id: String,

    /// Unique within a tenant
    pub log_id: String,

    /// Raw submitted content, preserved verbatim
    pub original_text: String,

    pub source: LogSource,
}

impl LogEvent {
    pub fn new(
        tenant_id: impl Into<String>,
        log_id: impl Into<String>,
        original_text: impl Into<String>,
        source: LogSource,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            log_id: log_id.into(),
            original_text: original_text.into(),
            source,
        }
    }

    /// Serialize into a queue message body
    pub fn to_message_body(&self) -> EventResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a queue message body.
    ///
    /// Rejects payloads that are not valid JSON, that miss a field, carry an
    /// unknown `source`, or have an empty `tenant_id`, `log_id` or
    /// `original_text`.
    pub fn from_message_body(body: &str) -> EventResult<Self> {
        let event: LogEvent = serde_json::from_str(body)?;

        if event.tenant_id.is_empty() {
            return Err(EventError::MissingField("tenant_id"));
        }
        if event.log_id.is_empty() {
            return Err(EventError::MissingField("log_id"));
        }
        if event.original_text.is_empty() {
            return Err(EventError::MissingField("original_text"));
        }

        Ok(event)
    }
}

/// Generate a fresh, time-ordered log identifier
pub fn generate_log_id() -> String {
    Uuid::now_v7().to_string()
}

/// Lifecycle status of a stored record. Only successful processing writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Processed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Processed => "PROCESSED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PROCESSED" => Some(RecordStatus::Processed),
            _ => None,
        }
    }
}

/// Storage-side projection of a processed [`LogEvent`], keyed by
/// `(tenant_id, log_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub tenant_id: String,
    pub log_id: String,
    pub original_text: String,
    pub source: LogSource,

    /// Redacted copy of `original_text`
    pub modified_data: String,

    #[serde(with = "rfc3339_seconds")]
    pub processed_at: DateTime<Utc>,

    pub status: RecordStatus,
}

impl ProcessedRecord {
    /// Build the stored projection. Original fields are copied as-is.
    pub fn from_event(
        event: &LogEvent,
        modified_data: impl Into<String>,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id: event.tenant_id.clone(),
            log_id: event.log_id.clone(),
            original_text: event.original_text.clone(),
            source: event.source,
            modified_data: modified_data.into(),
            processed_at,
            status: RecordStatus::Processed,
        }
    }

    /// `processed_at` as stored: RFC 3339, UTC, whole seconds
    pub fn processed_at_rfc3339(&self) -> String {
        format_timestamp(&self.processed_at)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

pub fn parse_timestamp(value: &str) -> EventResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| EventError::InvalidTimestamp(format!("{}: {}", value, e)))
}

mod rfc3339_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
