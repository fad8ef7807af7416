/// Configuration management
use serde::Deserialize;

fn default_http_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    crate::DEFAULT_MAX_BODY_BYTES
}

fn default_service_name() -> String {
    "ingest-service".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Destination queue for normalized events (`QUEUE_URL`)
    pub queue_url: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Largest accepted request body; bigger uploads get 413 (`MAX_BODY_BYTES`)
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Config {
    /// Load from the process environment. `QUEUE_URL` is required.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn from_iter<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}
