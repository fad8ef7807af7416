use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use log_worker::{
    metrics, BatchProcessor, Config, DynamoRecordStore, LinearCost, QueueConsumer, RecordWriter,
    SqsQueueSource,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,log_worker=debug".into());

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

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()
        .context("Failed to load configuration (QUEUE_URL and TABLE_NAME are required)")?;
    tracing::info!(
        service = %config.service_name,
        queue_url = %config.queue_url,
        table_name = %config.table_name,
        batch_size = config.worker_batch_size,
        concurrency = config.worker_concurrency,
        "Configuration loaded"
    );

    // Clients are built once and shared by every batch
    let aws_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = Arc::new(DynamoRecordStore::new(
        aws_sdk_dynamodb::Client::new(&aws_config),
        config.table_name.clone(),
    ));
    let source = Arc::new(SqsQueueSource::new(
        aws_sdk_sqs::Client::new(&aws_config),
        &config,
    ));

    let processor = BatchProcessor::new(
        RecordWriter::new(store),
        Arc::new(LinearCost::new(config.cost_per_byte(), config.cost_cap())),
        config.worker_concurrency,
    );
    let consumer = QueueConsumer::new(source, processor);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let consumer_task = tokio::spawn(async move {
        consumer.run(shutdown_rx).await;
    });

    tracing::info!("Starting health server on 0.0.0.0:{}", config.health_port);
    let server = HttpServer::new(|| {
        App::new()
            .route("/health", web::get().to(|| async { HttpResponse::Ok().body("OK") }))
            .route("/ready", web::get().to(|| async { HttpResponse::Ok().body("READY") }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
    })
    .disable_signals()
    .bind(("0.0.0.0", config.health_port))
    .context("Failed to bind health server")?
    .run();
    let server_handle = server.handle();
    actix_rt::spawn(server);

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, finishing in-flight batch");

    let _ = shutdown_tx.send(true);
    consumer_task.await.context("Consumer task failed")?;
    server_handle.stop(true).await;

    tracing::info!("log-worker stopped");
    Ok(())
}
