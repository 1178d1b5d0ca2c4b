//! Camera Webhook Analytics Processor
//!
//! Main entry point.

use camhook::{
    config::ProcessorConfig,
    publisher::{ImageStore, StateStoreClient},
    state::{AppConfig, AppState},
    web_api,
    webhook_log::WebhookLog,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camhook=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting camhook v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default();
    let processor = ProcessorConfig::from_env();
    tracing::info!(
        store_url = %config.store_url,
        port = config.port,
        viewer_dir = %config.viewer_dir.display(),
        webhook_dump_dir = %config.webhook_dump_dir.display(),
        "Configuration loaded"
    );
    tracing::info!(
        width = processor.resolution.0,
        height = processor.resolution.1,
        regions = processor.region_directions.len(),
        invert = processor.invert_direction,
        "Processor configuration loaded"
    );

    // Output directories are required; failure to create them is fatal
    let images = ImageStore::new(
        config.viewer_dir.clone(),
        config.image_filename.clone(),
        config.timestamp_filename.clone(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create viewer directory: {e}"))?;

    let webhook_log = WebhookLog::new(
        config.webhook_dump_dir.clone(),
        config.max_webhook_files,
        config.log_webhooks,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create webhook dump directory: {e}"))?;

    let store = StateStoreClient::new(config.store_url.clone());
    if !store.health_check().await {
        tracing::warn!(store_url = %config.store_url, "State store unreachable at startup");
    }

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        config: Arc::new(config),
        processor: Arc::new(processor),
        store: Arc::new(store),
        images: Arc::new(images),
        webhook_log: Arc::new(webhook_log),
        started_at: chrono::Utc::now(),
    };

    let app = web_api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening for camera webhooks");
    axum::serve(listener, app).await?;

    Ok(())
}
