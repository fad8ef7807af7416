use actix_web::http::header::{HeaderMap, CONTENT_TYPE};
use log_event::{generate_log_id, LogEvent, LogSource};
use serde_json::{Map, Value};

use crate::error::{IngestError, Result};

pub const TENANT_HEADER: &str = "x-tenant-id";

/// Fields accepted from a JSON upload.
///
/// A field that is missing and a field of the wrong type both decode to
/// `None`; only a body that is not JSON at all is an error.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JsonSubmission {
    pub tenant_id: Option<String>,
    pub text: Option<String>,
    pub log_id: Option<String>,
}

impl JsonSubmission {
    pub fn decode(body: &[u8]) -> Result<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| IngestError::InvalidJson(e.to_string()))?;

        match value {
            Value::Object(fields) => Ok(Self {
                tenant_id: string_field(&fields, "tenant_id"),
                text: string_field(&fields, "text"),
                log_id: string_field(&fields, "log_id"),
            }),
            // `null` decodes as an empty object
            Value::Null => Ok(Self::default()),
            other => Err(IngestError::InvalidJson(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            tracing::debug!(
                field = name,
                found = json_kind(other),
                "Ignoring non-string field in JSON upload"
            );
            None
        }
        None => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Dispatch decided from the `Content-Type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Text,
}

impl PayloadKind {
    /// Case-insensitive substring match so charset parameters are tolerated
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let content_type = content_type.to_ascii_lowercase();
        if content_type.contains("application/json") {
            Some(PayloadKind::Json)
        } else if content_type.contains("text/plain") {
            Some(PayloadKind::Text)
        } else {
            None
        }
    }
}

/// Converts raw HTTP submissions into [`LogEvent`]s.
///
/// Pure apart from identifier generation: never touches the queue.
#[derive(Clone)]
pub struct Normalizer {
    id_generator: fn() -> String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            id_generator: generate_log_id,
        }
    }

    pub fn with_id_generator(id_generator: fn() -> String) -> Self {
        Self { id_generator }
    }

    /// Validate and normalize a request.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// content type, body decoding, `tenant_id`, text.
    pub fn normalize(&self, headers: &HeaderMap, body: &[u8]) -> Result<LogEvent> {
        let content_type = header_str(headers, CONTENT_TYPE.as_str()).unwrap_or_default();
        let kind =
            PayloadKind::from_content_type(content_type).ok_or(IngestError::UnsupportedContentType)?;

        let (tenant_id, original_text, log_id, source) = match kind {
            PayloadKind::Json => {
                let submission = JsonSubmission::decode(body)?;
                (
                    submission.tenant_id.unwrap_or_default(),
                    submission.text.unwrap_or_default(),
                    submission.log_id,
                    LogSource::JsonUpload,
                )
            }
            PayloadKind::Text => {
                let text = std::str::from_utf8(body).map_err(|_| IngestError::InvalidEncoding)?;
                (
                    header_str(headers, TENANT_HEADER)
                        .unwrap_or_default()
                        .to_string(),
                    text.to_string(),
                    None,
                    LogSource::TextUpload,
                )
            }
        };

        if tenant_id.is_empty() {
            return Err(IngestError::MissingTenantId);
        }
        if original_text.is_empty() {
            return Err(IngestError::MissingText);
        }

        let log_id = log_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(self.id_generator);

        Ok(LogEvent {
            tenant_id,
            log_id,
            original_text,
            source,
        })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
