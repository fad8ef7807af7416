use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, TextEncoder};

static MESSAGES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "worker_messages_total",
            "Queue messages handled by log-worker, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create worker_messages_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register worker_messages_total");
    counter
});

static BATCHES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new("worker_batches_total", "Batches processed by log-worker")
        .expect("failed to create worker_batches_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register worker_batches_total");
    counter
});

pub fn record_batch(processed: usize, failed: usize) {
    BATCHES_TOTAL.inc();
    MESSAGES_TOTAL
        .with_label_values(&["processed"])
        .inc_by(processed as u64);
    MESSAGES_TOTAL
        .with_label_values(&["failed"])
        .inc_by(failed as u64);
}

pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
