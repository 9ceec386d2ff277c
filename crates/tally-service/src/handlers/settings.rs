//! Tenant billing settings handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use tally_core::TenantBillingSettings;
use tally_store::SettingsProvider;

use super::parse_tenant;
use crate::error::ApiError;
use crate::state::AppState;

/// Get a tenant's settings (defaults if never set).
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<TenantBillingSettings>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    Ok(Json(state.store.settings(&tenant)?))
}

/// Replace a tenant's settings.
pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<TenantBillingSettings>, JsonRejection>,
) -> Result<Json<TenantBillingSettings>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(settings) = payload?;

    state.store.put_settings(&tenant, settings.clone())?;
    Ok(Json(settings))
}
