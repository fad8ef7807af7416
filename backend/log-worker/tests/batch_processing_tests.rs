/// Worker pipeline tests
///
/// This test module covers:
/// - Partial failure isolation inside a batch
/// - Idempotent rewrites on redelivery
/// - Tenant isolation of stored records
/// - Acknowledgement of processed messages only
/// - Consumer shutdown between batches
use async_trait::async_trait;
use log_event::{LogEvent, LogSource, ProcessedRecord};
use log_worker::{
    BatchProcessor, InMemoryRecordStore, LinearCost, NoCost, QueueConsumer, QueueMessage,
    QueueSource, RecordStore, RecordWriter, WorkerError,
};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

/// Store that fails writes for selected log ids
struct FlakyStore {
    inner: InMemoryRecordStore,
    failing_log_ids: HashSet<String>,
}

impl FlakyStore {
    fn failing(ids: &[&str]) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            failing_log_ids: ids.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn put_record(&self, record: &ProcessedRecord) -> log_worker::Result<()> {
        if self.failing_log_ids.contains(&record.log_id) {
            return Err(WorkerError::Store("ProvisionedThroughputExceededException".into()));
        }
        self.inner.put_record(record).await
    }

    async fn records_for_tenant(&self, tenant_id: &str) -> log_worker::Result<Vec<ProcessedRecord>> {
        self.inner.records_for_tenant(tenant_id).await
    }
}

/// Store that panics mid-write for one log id
struct PanickingStore {
    inner: InMemoryRecordStore,
    panic_on: &'static str,
}

#[async_trait]
impl RecordStore for PanickingStore {
    async fn put_record(&self, record: &ProcessedRecord) -> log_worker::Result<()> {
        if record.log_id == self.panic_on {
            panic!("store client poisoned while writing {}", record.log_id);
        }
        self.inner.put_record(record).await
    }

    async fn records_for_tenant(&self, tenant_id: &str) -> log_worker::Result<Vec<ProcessedRecord>> {
        self.inner.records_for_tenant(tenant_id).await
    }
}

/// Queue that hands out scripted batches and records acknowledgements
#[derive(Default)]
struct ScriptedQueue {
    batches: Mutex<VecDeque<Vec<QueueMessage>>>,
    acknowledged: Mutex<Vec<String>>,
}

impl ScriptedQueue {
    fn with_batches(batches: Vec<Vec<QueueMessage>>) -> Self {
        Self {
            batches: Mutex::new(batches.into()),
            acknowledged: Mutex::new(Vec::new()),
        }
    }

    fn acknowledged(&self) -> Vec<String> {
        let mut ids = self.acknowledged.lock().unwrap().clone();
        ids.sort();
        ids
    }
}

#[async_trait]
impl QueueSource for ScriptedQueue {
    async fn receive(&self) -> log_worker::Result<Vec<QueueMessage>> {
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => Ok(batch),
            // nothing left: behave like an idle long poll
            None => std::future::pending().await,
        }
    }

    async fn acknowledge(&self, messages: &[QueueMessage]) -> log_worker::Result<()> {
        self.acknowledged
            .lock()
            .unwrap()
            .extend(messages.iter().map(|m| m.message_id.clone()));
        Ok(())
    }
}

fn message(id: &str, tenant: &str, log_id: &str, text: &str) -> QueueMessage {
    let event = LogEvent::new(tenant, log_id, text, LogSource::JsonUpload);
    QueueMessage::new(id, event.to_message_body().unwrap())
}

fn processor(store: Arc<dyn RecordStore>) -> BatchProcessor {
    BatchProcessor::new(RecordWriter::new(store), Arc::new(NoCost), 4)
}

#[tokio::test]
async fn store_failure_only_fails_that_message() {
    let store = Arc::new(FlakyStore::failing(&["2"]));
    let batch = vec![
        message("m1", "acme_corp", "1", "first 800-555-0199"),
        message("m2", "acme_corp", "2", "second"),
        message("m3", "acme_corp", "3", "third a@b.com"),
        QueueMessage::new("m4", "garbage"),
        message("m5", "beta_inc", "5", "fifth"),
    ];

    let response = processor(store.clone()).handle(&batch).await;

    let mut failed = response.failed_ids();
    failed.sort();
    assert_eq!(failed, vec!["m2", "m4"]);

    assert_eq!(store.inner.len(), 3);
    assert_eq!(
        store.inner.get("acme_corp", "1").unwrap().modified_data,
        "first [REDACTED]"
    );
    assert_eq!(
        store.inner.get("acme_corp", "3").unwrap().modified_data,
        "third [REDACTED]"
    );
    assert!(store.inner.get("acme_corp", "2").is_none());
    assert!(store.inner.get("beta_inc", "5").is_some());
}

#[tokio::test]
async fn panic_while_writing_only_fails_that_message() {
    let store = Arc::new(PanickingStore {
        inner: InMemoryRecordStore::new(),
        panic_on: "2",
    });
    let batch = vec![
        message("m1", "acme_corp", "1", "first"),
        message("m2", "acme_corp", "2", "second"),
        message("m3", "beta_inc", "3", "third"),
    ];

    let report = processor(store.clone()).process_batch(&batch).await;

    assert_eq!(report.failed_ids().collect::<Vec<_>>(), vec!["m2"]);
    let mut processed: Vec<&str> = report.processed_ids().collect();
    processed.sort();
    assert_eq!(processed, vec!["m1", "m3"]);

    assert_eq!(store.inner.len(), 2);
    assert!(store.inner.get("acme_corp", "1").is_some());
    assert!(store.inner.get("beta_inc", "3").is_some());
    assert!(store.inner.get("acme_corp", "2").is_none());
}

#[tokio::test]
async fn every_message_failing_reports_every_id() {
    let store = Arc::new(FlakyStore::failing(&["1", "2"]));
    let batch = vec![
        message("m1", "acme_corp", "1", "a"),
        message("m2", "acme_corp", "2", "b"),
    ];

    let report = processor(store.clone()).process_batch(&batch).await;

    assert_eq!(report.failed_count(), 2);
    assert!(store.inner.is_empty());
}

#[tokio::test]
async fn redelivery_rewrites_same_record() {
    let store = Arc::new(InMemoryRecordStore::new());
    let processor = processor(store.clone());
    let delivery = message("m1", "acme_corp", "101", "ssn 123-45-6789");

    processor.process_batch(&[delivery.clone()]).await;
    let first = store.get("acme_corp", "101").unwrap();

    processor.process_batch(&[delivery]).await;
    let second = store.get("acme_corp", "101").unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(first.modified_data, second.modified_data);
    assert_eq!(first.original_text, second.original_text);
    assert_eq!(second.modified_data, "ssn [REDACTED]");
}

#[tokio::test]
async fn tenant_queries_never_cross_partitions() {
    let store = Arc::new(InMemoryRecordStore::new());
    let batch = vec![
        message("m1", "tenant_a", "1", "a-one"),
        message("m2", "tenant_b", "1", "b-one"),
        message("m3", "tenant_a", "2", "a-two"),
    ];

    processor(store.clone()).process_batch(&batch).await;

    for tenant in ["tenant_a", "tenant_b"] {
        let records = store.records_for_tenant(tenant).await.unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|r| r.tenant_id == tenant));
    }
    assert_eq!(store.records_for_tenant("tenant_a").await.unwrap().len(), 2);
}

#[tokio::test]
async fn acme_scenario_end_state() {
    let store = Arc::new(InMemoryRecordStore::new());
    let batch = vec![message(
        "m1",
        "acme_corp",
        "101",
        "User 800-555-0199 logged in from 192.168.1.1",
    )];

    let response = processor(store.clone()).handle(&batch).await;
    assert!(response.batch_item_failures.is_empty());

    let record = store.get("acme_corp", "101").unwrap();
    assert_eq!(record.modified_data, "User [REDACTED] logged in from 192.168.1.1");
    assert_eq!(record.original_text, "User 800-555-0199 logged in from 192.168.1.1");
    assert_eq!(record.source, LogSource::JsonUpload);
}

#[tokio::test(start_paused = true)]
async fn simulated_cost_does_not_serialize_the_batch() {
    let store = Arc::new(InMemoryRecordStore::new());
    let cost = LinearCost::new(Duration::from_millis(100), Duration::from_secs(1));
    let processor = BatchProcessor::new(RecordWriter::new(store.clone()), Arc::new(cost), 4);
    let batch: Vec<QueueMessage> = (0..4)
        .map(|i| message(&format!("m{}", i), "acme_corp", &i.to_string(), &"x".repeat(50)))
        .collect();

    let started = tokio::time::Instant::now();
    let report = processor.process_batch(&batch).await;

    assert_eq!(report.failed_count(), 0);
    assert_eq!(store.len(), 4);
    // each message costs the 1s cap; run concurrently they finish together
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn consumer_acknowledges_only_persisted_messages() {
    let store = Arc::new(FlakyStore::failing(&["2"]));
    let queue = Arc::new(ScriptedQueue::with_batches(vec![vec![
        message("m1", "acme_corp", "1", "one"),
        message("m2", "acme_corp", "2", "two"),
        QueueMessage::new("m3", "{\"tenant_id\":\"acme_corp\"}"),
        message("m4", "acme_corp", "4", "four"),
    ]]));
    let consumer = QueueConsumer::new(queue.clone(), processor(store));

    let report = consumer.poll_once().await.unwrap();

    assert_eq!(report.failed_count(), 2);
    assert_eq!(queue.acknowledged(), vec!["m1", "m4"]);
}

#[tokio::test]
async fn consumer_run_drains_batches_then_stops() {
    let store = Arc::new(InMemoryRecordStore::new());
    let queue = Arc::new(ScriptedQueue::with_batches(vec![
        vec![message("m1", "acme_corp", "1", "one")],
        vec![
            message("m2", "beta_inc", "2", "two"),
            message("m3", "beta_inc", "3", "three"),
        ],
    ]));
    let consumer = Arc::new(QueueConsumer::new(queue.clone(), processor(store.clone())));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let task = {
        let consumer = consumer.clone();
        tokio::spawn(async move { consumer.run(shutdown_rx).await })
    };

    for _ in 0..100 {
        if store.len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("consumer did not stop")
        .unwrap();

    assert_eq!(store.len(), 3);
    assert_eq!(queue.acknowledged(), vec!["m1", "m2", "m3"]);
}
