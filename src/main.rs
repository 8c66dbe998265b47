use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use template_relay::app_state::AppState;
use template_relay::config::AppConfig;
use template_relay::routes;
use template_relay::services::{
    lark::{LarkClient, LarkSettings},
    storage::R2Client,
    version::{MemoryVersionStore, RedisVersionStore, VersionStore},
    webhook::WebhookClient,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing template-relay server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    metrics::describe_counter!("template_uploads_total", "Templates uploaded and registered");
    metrics::describe_counter!("submissions_total", "Valid generation requests relayed");
    metrics::describe_counter!(
        "webhook_deliveries_total",
        "Webhook delivery attempts by target and outcome"
    );
    metrics::describe_counter!("record_store_pages_total", "Record store pages fetched");
    metrics::describe_histogram!(
        "record_store_list_seconds",
        "Time to read every page of a record store table"
    );

    tracing::info!(api_base = %config.lark_api_base, "Initializing Lark Base client");
    let lark = LarkClient::new(LarkSettings::from(&config));

    tracing::info!("Initializing R2 storage client");
    let r2_client = R2Client::new(
        &config.r2_bucket,
        &config.r2_endpoint,
        &config.r2_access_key,
        &config.r2_secret_key,
        &config.r2_public_url,
    )
    .expect("Failed to initialize R2 client");

    let versions: Arc<dyn VersionStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Keeping option version in Redis");
            Arc::new(RedisVersionStore::new(url).expect("Failed to initialize Redis version store"))
        }
        None => {
            tracing::warn!("REDIS_URL not set; option version resets on restart");
            Arc::new(MemoryVersionStore::new())
        }
    };

    let state = AppState::new(
        lark,
        r2_client,
        WebhookClient::new(config.submit_webhook_url.clone(), "submit"),
        WebhookClient::new(config.slide_webhook_url.clone(), "slide"),
        versions,
    );

    let app = routes::build_router(state).route(
        "/metrics",
        get(move || std::future::ready(prometheus_handle.render())),
    );
    let app = routes::with_layers(app, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.expect("Server error");
}
