pub mod batch_processor;
pub mod cost;
pub mod memory_store;
pub mod queue_consumer;
pub mod record_writer;
pub mod redactor;

pub use batch_processor::{BatchProcessor, BatchReport};
pub use cost::{CostModel, LinearCost, NoCost};
pub use memory_store::InMemoryRecordStore;
pub use queue_consumer::{QueueConsumer, QueueSource, SqsQueueSource};
pub use record_writer::{DynamoRecordStore, RecordStore, RecordWriter};
pub use redactor::{redact, REDACTION_MARKER};
