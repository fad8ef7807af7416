use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use ingest_service::{handlers, AppState, Config, SqsEventQueue};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,ingest_service=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration (QUEUE_URL is required)")?;
    tracing::info!(
        service = %config.service_name,
        http_port = config.http_port,
        queue_url = %config.queue_url,
        "Configuration loaded"
    );

    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let queue = SqsEventQueue::new(aws_sdk_sqs::Client::new(&aws_config), config.queue_url.clone());
    let state = web::Data::new(
        AppState::new(Arc::new(queue)).with_max_body_bytes(config.max_body_bytes),
    );

    tracing::info!("Starting HTTP server on 0.0.0.0:{}", config.http_port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(("0.0.0.0", config.http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}
