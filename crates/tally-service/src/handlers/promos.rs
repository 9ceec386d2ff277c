//! Promo code handlers.
//!
//! `preview` is a dry run: it validates the code and computes the discount
//! without consuming a use. `redeem` previews and then commits one use
//! atomically through the promo store. A replayed `redemption_id` is answered
//! with a conflict before the code is previewed again.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use tally_core::{preview, DiscountPreview, DiscountType, PromoCode, RedemptionId, TenantId};
use tally_store::{PromoStore, Redemption, StoreError};

use super::parse_tenant;
use crate::error::ApiError;
use crate::state::AppState;

/// Create promo request.
#[derive(Debug, Deserialize)]
pub struct CreatePromoRequest {
    /// The code (case-insensitive, stored upper-case).
    pub code: String,
    /// Percentage or flat discount.
    pub discount_type: DiscountType,
    /// Percent (0–100) or currency amount.
    pub discount_value: Decimal,
    /// Expiration instant; never expires when absent.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Service codes the promo is limited to; all services when absent.
    #[serde(default)]
    pub services: Option<Vec<String>>,
    /// Redemption cap; unlimited when absent.
    #[serde(default)]
    pub usage_limit: Option<u32>,
}

/// Activate/deactivate request.
#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    /// New state.
    pub active: bool,
}

/// Preview or redeem request.
#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    /// Subtotal to discount.
    pub subtotal: Decimal,
    /// Service codes the subtotal was charged for.
    #[serde(default)]
    pub service_codes: Vec<String>,
    /// Idempotency key for `redeem`; generated when absent.
    #[serde(default)]
    pub redemption_id: Option<RedemptionId>,
}

/// Create a promo code.
pub async fn create_promo(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<CreatePromoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PromoCode>), ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;

    let mut promo = PromoCode::new(&body.code, body.discount_type, body.discount_value, Utc::now())?;
    if let Some(at) = body.expires_at {
        promo = promo.expiring_at(at);
    }
    if let Some(services) = body.services {
        promo = promo.for_services(services);
    }
    if let Some(limit) = body.usage_limit {
        promo = promo.limited_to(limit);
    }

    let promo = state.store.create_promo(&tenant, promo)?;
    Ok((StatusCode::CREATED, Json(promo)))
}

/// Get a promo code.
pub async fn get_promo(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, code)): Path<(String, String)>,
) -> Result<Json<PromoCode>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    Ok(Json(find_promo(&state, &tenant, &code)?))
}

/// Activate or deactivate a promo code.
pub async fn set_promo_active(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, code)): Path<(String, String)>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<PromoCode>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;

    Ok(Json(state.store.set_promo_active(&tenant, &code, body.active)?))
}

/// Compute a discount without consuming a use.
pub async fn preview_promo(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, code)): Path<(String, String)>,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> Result<Json<DiscountPreview>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;

    let promo = find_promo(&state, &tenant, &code)?;
    let discount = preview(&promo, body.subtotal, &body.service_codes, Utc::now())?;

    tracing::debug!(
        tenant_id = %tenant,
        promo_code = %discount.code,
        discounted = %discount.discounted_amount,
        "Promo previewed"
    );

    Ok(Json(discount))
}

/// Compute a discount and consume one use of the code.
pub async fn redeem_promo(
    State(state): State<Arc<AppState>>,
    Path((tenant_id, code)): Path<(String, String)>,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> Result<Json<Redemption>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;

    let now = Utc::now();

    if let Some(redemption_id) = body.redemption_id {
        if state.store.is_redeemed(&tenant, redemption_id)? {
            return Err(StoreError::DuplicateRedemption { redemption_id }.into());
        }
    }

    let promo = find_promo(&state, &tenant, &code)?;
    let decision = preview(&promo, body.subtotal, &body.service_codes, now)?
        .into_redemption(body.redemption_id.unwrap_or_else(|| RedemptionId::at(now)));

    let redemption = state.store.commit_redemption(&tenant, decision)?;
    Ok(Json(redemption))
}

fn find_promo(state: &AppState, tenant: &TenantId, code: &str) -> Result<PromoCode, ApiError> {
    state
        .store
        .get_promo(tenant, code)?
        .ok_or_else(|| ApiError::NotFound(format!("promo not found: {}", code.trim())))
}
