//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, promos, quotes, services, settings};
use crate::state::AppState;

/// Maximum concurrent requests for tenant API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Catalog
/// - `GET /v1/tenants/:tenant_id/services` - List service entries
/// - `POST /v1/tenants/:tenant_id/services` - Create/update a service entry
/// - `POST /v1/tenants/:tenant_id/services/:code/active` - Activate/deactivate
///
/// ## Settings
/// - `GET /v1/tenants/:tenant_id/settings` - Get billing settings
/// - `PUT /v1/tenants/:tenant_id/settings` - Replace billing settings
///
/// ## Quotes
/// - `POST /v1/tenants/:tenant_id/quotes` - Price a charge
///
/// ## Promos
/// - `POST /v1/tenants/:tenant_id/promos` - Create a promo code
/// - `GET /v1/tenants/:tenant_id/promos/:code` - Get a promo code
/// - `POST /v1/tenants/:tenant_id/promos/:code/active` - Activate/deactivate
/// - `POST /v1/tenants/:tenant_id/promos/:code/preview` - Dry-run a discount
/// - `POST /v1/tenants/:tenant_id/promos/:code/redeem` - Apply and consume a use
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let tenant_routes = Router::new()
        // Catalog
        .route(
            "/services",
            get(services::list_services).post(services::upsert_service),
        )
        .route("/services/:code/active", post(services::set_service_active))
        // Settings
        .route(
            "/settings",
            get(settings::get_settings).put(settings::put_settings),
        )
        // Quotes
        .route("/quotes", post(quotes::create_quote))
        // Promos
        .route("/promos", post(promos::create_promo))
        .route("/promos/:code", get(promos::get_promo))
        .route("/promos/:code/active", post(promos::set_promo_active))
        .route("/promos/:code/preview", post(promos::preview_promo))
        .route("/promos/:code/redeem", post(promos::redeem_promo))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // Tenant-scoped API (rate limited)
        .nest("/v1/tenants/:tenant_id", tenant_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
