use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};
use log_event::{parse_timestamp, LogEvent, LogSource, ProcessedRecord, RecordStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{Result, WorkerError};

pub const PARTITION_KEY: &str = "tenant_id";
pub const SORT_KEY: &str = "log_id";

/// Tenant-partitioned record storage.
///
/// `put_record` is an unconditional upsert on `(tenant_id, log_id)`: writing
/// the same record again leaves exactly one equivalent record behind.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put_record(&self, record: &ProcessedRecord) -> Result<()>;

    /// Read-only inspection, scoped to one tenant partition
    async fn records_for_tenant(&self, tenant_id: &str) -> Result<Vec<ProcessedRecord>>;
}

/// DynamoDB table with partition key `tenant_id` and sort key `log_id`
#[derive(Clone)]
pub struct DynamoRecordStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoRecordStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn put_record(&self, record: &ProcessedRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(record)))
            .send()
            .await
            .map_err(|e| WorkerError::Store(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }

    async fn records_for_tenant(&self, tenant_id: &str) -> Result<Vec<ProcessedRecord>> {
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("#pk = :tenant_id")
                .expression_attribute_names("#pk", PARTITION_KEY)
                .expression_attribute_values(":tenant_id", AttributeValue::S(tenant_id.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| WorkerError::Store(DisplayErrorContext(&e).to_string()))?;

            for item in output.items() {
                records.push(item_to_record(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(records)
    }
}

/// Attribute map written for a record. All attributes are strings.
pub fn record_to_item(record: &ProcessedRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (
            PARTITION_KEY.to_string(),
            AttributeValue::S(record.tenant_id.clone()),
        ),
        (SORT_KEY.to_string(), AttributeValue::S(record.log_id.clone())),
        (
            "source".to_string(),
            AttributeValue::S(record.source.as_str().to_string()),
        ),
        (
            "original_text".to_string(),
            AttributeValue::S(record.original_text.clone()),
        ),
        (
            "modified_data".to_string(),
            AttributeValue::S(record.modified_data.clone()),
        ),
        (
            "processed_at".to_string(),
            AttributeValue::S(record.processed_at_rfc3339()),
        ),
        (
            "status".to_string(),
            AttributeValue::S(record.status.as_str().to_string()),
        ),
    ])
}

pub fn item_to_record(item: &HashMap<String, AttributeValue>) -> Result<ProcessedRecord> {
    let source = string_attr(item, "source")?;
    let status = string_attr(item, "status")?;

    Ok(ProcessedRecord {
        tenant_id: string_attr(item, PARTITION_KEY)?.to_string(),
        log_id: string_attr(item, SORT_KEY)?.to_string(),
        original_text: string_attr(item, "original_text")?.to_string(),
        source: LogSource::parse(source)
            .ok_or_else(|| WorkerError::InvalidRecord(format!("unknown source: {}", source)))?,
        modified_data: string_attr(item, "modified_data")?.to_string(),
        processed_at: parse_timestamp(string_attr(item, "processed_at")?)
            .map_err(|e| WorkerError::InvalidRecord(e.to_string()))?,
        status: RecordStatus::parse(status)
            .ok_or_else(|| WorkerError::InvalidRecord(format!("unknown status: {}", status)))?,
    })
}

fn string_attr<'a>(item: &'a HashMap<String, AttributeValue>, name: &str) -> Result<&'a str> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| WorkerError::InvalidRecord(format!("missing string attribute: {}", name)))
}

/// Builds the processed projection of an event and persists it
#[derive(Clone)]
pub struct RecordWriter {
    store: Arc<dyn RecordStore>,
    clock: fn() -> DateTime<Utc>,
}

impl RecordWriter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Persist `event` with its redacted text. `processed_at` is taken at
    /// write time. Store failures are returned to the caller, never dropped.
    pub async fn write(&self, event: &LogEvent, modified_data: String) -> Result<ProcessedRecord> {
        let record = ProcessedRecord::from_event(event, modified_data, (self.clock)());
        self.store.put_record(&record).await?;

        info!(
            tenant_id = %record.tenant_id,
            log_id = %record.log_id,
            processed_at = %record.processed_at_rfc3339(),
            "Record persisted"
        );

        Ok(record)
    }
}
