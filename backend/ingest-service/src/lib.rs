pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod services;

use std::sync::Arc;

/// Request body limit used unless configured otherwise
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

pub use config::Config;
pub use error::{IngestError, Result};
pub use services::{AcceptedResponse, Enqueuer, EventQueue, Normalizer, SqsEventQueue};

/// Shared per-process state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub normalizer: Normalizer,
    pub enqueuer: Enqueuer,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(queue: Arc<dyn EventQueue>) -> Self {
        Self {
            normalizer: Normalizer::new(),
            enqueuer: Enqueuer::new(queue),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}
