use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;

use crate::error::IngestError;
use crate::metrics::{record_ingest, IngestOutcome};
use crate::AppState;

/// Accept a log submission
///
/// POST /logs
///
/// Responds `202` as soon as the event is queued; processing happens later.
pub async fn ingest_log(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, IngestError> {
    let normalized = read_body(payload, state.max_body_bytes)
        .await
        .and_then(|body| state.normalizer.normalize(req.headers(), &body));

    let event = match normalized {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(reason = %e, "Rejected log submission");
            record_ingest(IngestOutcome::Rejected);
            return Err(e);
        }
    };

    match state.enqueuer.enqueue(&event).await {
        Ok(accepted) => {
            record_ingest(IngestOutcome::Accepted);
            Ok(HttpResponse::Accepted().json(accepted))
        }
        Err(e) => {
            record_ingest(IngestOutcome::Failed);
            Err(e)
        }
    }
}

/// Buffer the request body, refusing to grow past `limit` bytes
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<web::BytesMut, IngestError> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| IngestError::InvalidBody(e.to_string()))?;
        if body.len() + chunk.len() > limit {
            return Err(IngestError::PayloadTooLarge);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

pub async fn ready() -> HttpResponse {
    HttpResponse::Ok().body("READY")
}
