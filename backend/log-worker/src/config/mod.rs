use serde::Deserialize;
use std::time::Duration;

/// Largest batch a single receive may return
pub const MAX_BATCH_SIZE: i32 = 10;

fn default_batch_size() -> i32 {
    MAX_BATCH_SIZE
}

fn default_concurrency() -> usize {
    4
}

fn default_wait_time_seconds() -> i32 {
    20
}

fn default_visibility_timeout_seconds() -> i32 {
    60
}

fn default_cost_per_byte_ms() -> u64 {
    50
}

fn default_cost_cap_ms() -> u64 {
    5_000
}

fn default_health_port() -> u16 {
    8081
}

fn default_service_name() -> String {
    "log-worker".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Source queue (`QUEUE_URL`)
    pub queue_url: String,

    /// Destination table, partitioned by `tenant_id` (`TABLE_NAME`)
    pub table_name: String,

    #[serde(default = "default_batch_size")]
    pub worker_batch_size: i32,

    #[serde(default = "default_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_wait_time_seconds")]
    pub wait_time_seconds: i32,

    #[serde(default = "default_visibility_timeout_seconds")]
    pub visibility_timeout_seconds: i32,

    #[serde(default = "default_cost_per_byte_ms")]
    pub cost_per_byte_ms: u64,

    #[serde(default = "default_cost_cap_ms")]
    pub cost_cap_ms: u64,

    #[serde(default = "default_health_port")]
    pub health_port: u16,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Config {
    /// Load from the process environment. `QUEUE_URL` and `TABLE_NAME` are required.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map(Config::normalized)
    }

    pub fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars).map(Config::normalized)
    }

    fn normalized(mut self) -> Self {
        self.worker_batch_size = self.worker_batch_size.clamp(1, MAX_BATCH_SIZE);
        self.worker_concurrency = self.worker_concurrency.max(1);
        self.wait_time_seconds = self.wait_time_seconds.clamp(0, 20);
        self
    }

    pub fn cost_per_byte(&self) -> Duration {
        Duration::from_millis(self.cost_per_byte_ms)
    }

    pub fn cost_cap(&self) -> Duration {
        Duration::from_millis(self.cost_cap_ms)
    }
}
