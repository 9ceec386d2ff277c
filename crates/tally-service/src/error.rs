//! API error types and responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tally_core::BillingError;
use tally_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Redemption replayed (idempotency).
    #[error("duplicate redemption: {0}")]
    DuplicateRedemption(String),

    /// Redemption id issued outside the replay window.
    #[error("stale redemption: {0}")]
    StaleRedemption(String),

    /// The billing core refused the request.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// HTTP status for a billing error.
///
/// Missing services are 404, clashes are 409, well-formed requests the
/// billing rules refuse are 422, and malformed values are 400.
#[must_use]
pub const fn billing_status(err: &BillingError) -> StatusCode {
    match err {
        BillingError::NoMatchingService { .. } | BillingError::ServiceNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        BillingError::DuplicateServiceCode { .. } | BillingError::DuplicateServiceScope { .. } => {
            StatusCode::CONFLICT
        }
        BillingError::RateUnset { .. }
        | BillingError::PromoExpired { .. }
        | BillingError::PromoExhausted { .. }
        | BillingError::PromoNotActive { .. }
        | BillingError::PromoScopeMismatch { .. }
        | BillingError::CoverageDisabled
        | BillingError::CoverageNotApplicable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BillingError::InvalidQuantity { .. }
        | BillingError::InvalidAmount { .. }
        | BillingError::InvalidDeclaredValue { .. }
        | BillingError::InvalidServiceEntry(_)
        | BillingError::InvalidPromo(_)
        | BillingError::InvalidId(_) => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::DuplicateRedemption(id) => (
                StatusCode::CONFLICT,
                "duplicate_redemption",
                format!("Redemption {id} already committed"),
                Some(serde_json::json!({ "redemption_id": id })),
            ),
            Self::StaleRedemption(id) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "stale_redemption",
                format!("Redemption id {id} is outside the replay window"),
                Some(serde_json::json!({ "redemption_id": id })),
            ),
            Self::Billing(err) => (billing_status(err), err.code(), err.to_string(), None),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            StoreError::AlreadyExists { .. } => Self::Conflict(err.to_string()),
            StoreError::DuplicateRedemption { redemption_id } => {
                Self::DuplicateRedemption(redemption_id.to_string())
            }
            StoreError::StaleRedemption { redemption_id } => {
                Self::StaleRedemption(redemption_id.to_string())
            }
            StoreError::Billing(err) => Self::Billing(err),
            StoreError::Serialization(msg) | StoreError::Io(msg) => Self::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
