//! Charge quote handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use tally_core::{quote, ChargeContext, ChargeQuote, CoverageRequest, PromoRejection, QuoteRequest};
use tally_store::{CatalogProvider, PromoStore, SettingsProvider};

use super::parse_tenant;
use crate::error::ApiError;
use crate::state::AppState;

/// Quote request body.
#[derive(Debug, Deserialize)]
pub struct QuoteBody {
    /// What is being charged for.
    pub context: ChargeContext,
    /// Billable quantity.
    pub quantity: Decimal,
    /// Operator-entered rate.
    #[serde(default)]
    pub override_rate: Option<Decimal>,
    /// Minimum charge (tenant default when absent).
    #[serde(default)]
    pub minimum_charge: Option<Decimal>,
    /// Coverage to add.
    #[serde(default)]
    pub coverage: Option<CoverageRequest>,
    /// Promo code to preview against the charge. Never consumed here.
    #[serde(default)]
    pub promo_code: Option<String>,
}

impl QuoteBody {
    fn to_request(&self) -> QuoteRequest {
        QuoteRequest {
            context: self.context.clone(),
            quantity: self.quantity,
            override_rate: self.override_rate,
            minimum_charge: self.minimum_charge,
            coverage: self.coverage.clone(),
        }
    }
}

/// Price a charge.
///
/// A promo code that cannot be applied does not fail the quote: the response
/// carries the undiscounted subtotal and a `promo_rejection`.
pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    Path(tenant_id): Path<String>,
    payload: Result<Json<QuoteBody>, JsonRejection>,
) -> Result<Json<ChargeQuote>, ApiError> {
    let tenant = parse_tenant(&tenant_id)?;
    let Json(body) = payload?;
    let now = Utc::now();

    let catalog = state.store.catalog(&tenant)?;
    let settings = state.store.settings(&tenant)?;

    let (promo, missing_promo) = match body.promo_code.as_deref() {
        None => (None, None),
        Some(code) => match state.store.get_promo(&tenant, code)? {
            Some(promo) => (Some(promo), None),
            None => (None, Some(code.to_string())),
        },
    };

    let mut quote = quote(&body.to_request(), &catalog, &settings, promo.as_ref(), now)?;

    if let Some(code) = missing_promo {
        quote.promo_rejection = Some(PromoRejection {
            message: format!("promo code {code} not found"),
            promo_code: code,
            reason: "promo_not_found".to_string(),
        });
    }

    if let Some(rejection) = &quote.promo_rejection {
        tracing::warn!(
            tenant_id = %tenant,
            promo_code = %rejection.promo_code,
            reason = %rejection.reason,
            "Promo code not applied to quote"
        );
    }

    tracing::debug!(
        tenant_id = %tenant,
        service_code = %quote.charge.service_code,
        tier = ?quote.resolution_tier,
        total = %quote.total,
        "Quote computed"
    );

    Ok(Json(quote))
}
