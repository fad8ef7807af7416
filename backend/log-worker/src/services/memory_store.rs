use async_trait::async_trait;
use dashmap::DashMap;
use log_event::ProcessedRecord;

use crate::error::Result;
use crate::services::record_writer::RecordStore;

/// In-process store keyed by `(tenant_id, log_id)`, for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: DashMap<(String, String), ProcessedRecord>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tenant_id: &str, log_id: &str) -> Option<ProcessedRecord> {
        self.records
            .get(&(tenant_id.to_string(), log_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put_record(&self, record: &ProcessedRecord) -> Result<()> {
        self.records.insert(
            (record.tenant_id.clone(), record.log_id.clone()),
            record.clone(),
        );
        Ok(())
    }

    async fn records_for_tenant(&self, tenant_id: &str) -> Result<Vec<ProcessedRecord>> {
        let mut records: Vec<ProcessedRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == tenant_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.log_id.cmp(&b.log_id));
        Ok(records)
    }
}
