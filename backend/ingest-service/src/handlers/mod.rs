//! HTTP handlers for the ingest service
//!
//! - `POST /logs` (and `POST /`): accept a log submission
//! - `GET /health`, `GET /ready`: probes
//! - `GET /metrics`: Prometheus exposition

pub mod ingest;

pub use ingest::{health, ingest_log, ready};

use actix_web::web;

use crate::metrics::serve_metrics;

/// Register all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/logs", web::post().to(ingest_log))
        .route("/", web::post().to(ingest_log))
        .route("/health", web::get().to(health))
        .route("/ready", web::get().to(ready))
        .route("/metrics", web::get().to(serve_metrics));
}
