pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WorkerError};
pub use models::{BatchItemFailure, BatchResponse, MessageOutcome, QueueMessage};
pub use services::{
    redact, BatchProcessor, BatchReport, CostModel, DynamoRecordStore, InMemoryRecordStore,
    LinearCost, NoCost, QueueConsumer, QueueSource, RecordStore, RecordWriter, SqsQueueSource,
};
