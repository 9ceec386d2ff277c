//! Tally Service - HTTP API for warehouse billing
//!
//! This is the main entry point for the tally service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_service::{create_router, AppState, ServiceConfig};
use tally_store::{load_seed_file, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tally=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Tally Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        seed_path = ?config.catalog_seed_path,
        max_body_bytes = config.max_body_bytes,
        request_timeout_seconds = config.request_timeout_seconds,
        "Service configuration loaded"
    );

    // Initialize the in-memory store, seeded if configured
    let store = match &config.catalog_seed_path {
        Some(path) => {
            tracing::info!(path = %path, "Loading catalog seed");
            MemoryStore::from_seed(load_seed_file(path)?)?
        }
        None => {
            tracing::warn!("No catalog seed configured - starting with empty catalogs");
            MemoryStore::new()
        }
    };
    let store = store.with_replay_window(chrono::Duration::hours(i64::from(
        config.redemption_window_hours,
    )));
    tracing::info!(
        tenants = store.tenant_count(),
        redemption_window_hours = config.redemption_window_hours,
        "Store ready"
    );

    // Build app state
    let state = AppState::new(Arc::new(store), config.clone());

    // Create the router
    let app = create_router(state);
    tracing::info!("Router configured with all API endpoints");

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
