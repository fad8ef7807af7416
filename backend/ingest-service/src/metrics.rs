use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, TextEncoder};

static INGEST_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "ingest_requests_total",
            "Log submissions handled by ingest-service, by outcome",
        ),
        &["outcome"],
    )
    .expect("failed to create ingest_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register ingest_requests_total");
    counter
});

#[derive(Debug, Clone, Copy)]
pub enum IngestOutcome {
    Accepted,
    Rejected,
    Failed,
}

impl IngestOutcome {
    fn as_label(&self) -> &'static str {
        match self {
            IngestOutcome::Accepted => "accepted",
            IngestOutcome::Rejected => "rejected",
            IngestOutcome::Failed => "failed",
        }
    }
}

pub fn record_ingest(outcome: IngestOutcome) {
    INGEST_REQUESTS_TOTAL
        .with_label_values(&[outcome.as_label()])
        .inc();
}

pub fn ingest_count(outcome: IngestOutcome) -> u64 {
    INGEST_REQUESTS_TOTAL
        .with_label_values(&[outcome.as_label()])
        .get()
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
