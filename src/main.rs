use anyhow::{Context, Result};
use sharepoint_connector::api::{create_entry_router, EntryAppState};
use sharepoint_connector::config::{ConfigProvider, ConnectorConfig};
use sharepoint_connector::diagnostics::TracingSink;
use sharepoint_connector::submit::build_http_client;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sharepoint_connector=info".into()),
        )
        .init();

    info!("SharePoint connector starting...");

    // Read configuration from environment
    let settings_path = std::env::var("SHAREPOINT_CONFIG")
        .unwrap_or_else(|_| "sharepoint.toml".to_string());

    let api_port: u16 = std::env::var("SHAREPOINT_API_PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .context("SHAREPOINT_API_PORT must be a valid port number")?;

    let config = ConnectorConfig::load(&settings_path)
        .with_context(|| format!("Failed to load configuration from {}", settings_path))?;

    info!(
        settings_path = %settings_path,
        connection_type = ?config.connection_type(),
        entities = config.entity_count(),
        log_requests = config.is_logging_enabled(),
        api_disabled = config.is_api_disabled(),
        timeout_secs = config.request_timeout().as_secs(),
        "Configuration loaded"
    );

    if config.default_host().is_empty() {
        tracing::warn!("No default SharePoint host configured; only entities with a host override can be posted");
    }

    let http_client = build_http_client(config.request_timeout())
        .context("Failed to build HTTP client")?;

    let state = EntryAppState {
        config: Arc::new(config),
        sink: Arc::new(TracingSink),
        http_client,
        login_base_url: None,
    };
    let router = create_entry_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", api_port))
        .await
        .context("Failed to bind API port")?;
    info!(port = api_port, "Entry API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Entry API server error")?;

    info!("SharePoint connector stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
    }
    info!("Shutdown signal received");
}
