//! Service catalog administration handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use tally_core::ServiceEntry;
use tally_store::CatalogProvider;

use super::parse_tenant;
use crate::error::ApiError;
use crate::state::AppState;

/// Catalog listing response.
#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    /// Entries in resolution order.
    pub services: Vec<ServiceEntry>,
    /// Number of active entries.
    pub active: usize,
}

/// Saved service entry response.
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    /// The entry as stored.
    pub service: ServiceEntry,
    /// Whether the entry was newly created.
    pub created: bool,
}

/// Activate/deactivate request.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    /// New state.
    pub active: bool,
}

/// List a tenant's catalog.
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
) -> Result<Json<ServiceListResponse>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let catalog = state.store.catalog(&tenant)?;

    Ok(Json(ServiceListResponse {
        active: catalog.active_entries().count(),
        services: catalog.entries().to_vec(),
    }))
}

/// Create or update a service entry.
///
/// Returns `201 Created` for a new code and `200 OK` for an update.
pub async fn upsert_service(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<ServiceEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(entry) = payload?;
    let service = entry.normalized();

    let created = state.store.upsert_service(&tenant, service.clone())?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(ServiceResponse { service, created })))
}

/// Activate or deactivate a service entry.
pub async fn set_service_active(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, code)): Path<(String, String)>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<ServiceEntry>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;

    let entry = state.store.set_service_active(&tenant, &code, body.active)?;
    Ok(Json(entry))
}
