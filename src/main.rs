//! chainsnap-gateway server entry point.
//!
//! Opens the snapshot store, builds the BlockCypher client and starts the
//! Axum HTTP server. Ctrl+C stops accepting connections and cancels
//! in-flight fetches.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use chainsnap_gateway::api;
use chainsnap_gateway::app_state::AppState;
use chainsnap_gateway::config::GatewayConfig;
use chainsnap_gateway::persistence::SnapshotStore;
use chainsnap_gateway::shutdown::{self, ShutdownTrigger};
use chainsnap_gateway::source::BlockcypherClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    init_tracing(config.log_json);
    tracing::info!(
        addr = %config.listen_addr,
        environment = ?config.environment,
        "starting chainsnap-gateway"
    );
    if config.blockcypher.endpoint_count_unexpected() {
        tracing::warn!(
            count = config.blockcypher.endpoints.len(),
            "expected one BlockCypher endpoint per supported chain"
        );
    }

    // Open storage
    let store = SnapshotStore::connect(
        &config.database_url,
        config.database_max_connections,
        Duration::from_secs(config.database_connect_timeout_secs),
    )
    .await
    .with_context(|| format!("failed to open database {}", config.database_url))?;
    store
        .ensure_schema()
        .await
        .context("failed to create database schema")?;

    // Build outbound client
    let client = BlockcypherClient::new(
        config.blockcypher.base_url.clone(),
        config.blockcypher.request_timeout,
        config.blockcypher.fetch_timeout,
    )
    .context("failed to build BlockCypher client")?;

    // Build application state
    let (trigger, signal) = shutdown::channel();
    let app_state = AppState::new(&config, store.clone(), Arc::new(client), signal.clone());

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    tokio::spawn(trigger_on_ctrl_c(trigger));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { signal.cancelled().await })
        .await
        .context("server error")?;

    store.close().await;
    tracing::info!("shutdown complete");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn trigger_on_ctrl_c(trigger: ShutdownTrigger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
    trigger.trigger();
}
