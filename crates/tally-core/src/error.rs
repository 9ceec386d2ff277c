//! Error types for tally.

use rust_decimal::Decimal;

use crate::catalog::ClassCode;
use crate::ids::IdError;

/// Result type for tally operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur while resolving, pricing, or discounting a charge.
///
/// Every variant is an expected outcome reported to the caller. A missing
/// price is never turned into a zero charge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BillingError {
    /// No active catalog entry applies to the charge context.
    #[error("no matching service for category={category} class={}", display_class(.class_code))]
    NoMatchingService {
        /// The requested semantic category (or explicit service code).
        category: String,
        /// The requested class, if any.
        class_code: Option<ClassCode>,
    },

    /// The resolved service has no rate and no override was given.
    #[error("rate not configured for service {service_code}")]
    RateUnset {
        /// The service whose rate is unset.
        service_code: String,
    },

    /// Quantity is negative.
    #[error("invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity.
        quantity: Decimal,
    },

    /// A monetary amount is negative or more precise than the currency allows.
    #[error("invalid amount for {field}: {value}")]
    InvalidAmount {
        /// Which input carried the amount.
        field: String,
        /// The rejected value.
        value: Decimal,
    },

    /// The promo code's expiration date has passed.
    #[error("promo code {code} expired")]
    PromoExpired {
        /// The promo code.
        code: String,
    },

    /// The promo code has no uses remaining.
    #[error("promo code {code} has no uses remaining")]
    PromoExhausted {
        /// The promo code.
        code: String,
    },

    /// The promo code was deactivated by an administrator.
    #[error("promo code {code} is not active")]
    PromoNotActive {
        /// The promo code.
        code: String,
    },

    /// The promo code does not cover any of the services being charged.
    #[error("promo code {code} does not apply to the selected services")]
    PromoScopeMismatch {
        /// The promo code.
        code: String,
    },

    /// Coverage was requested but is disabled for the tenant.
    #[error("valuation coverage is disabled")]
    CoverageDisabled,

    /// Coverage is not offered at the requested level (item or shipment).
    #[error("valuation coverage is not offered at {level} level")]
    CoverageNotApplicable {
        /// The requested level.
        level: String,
    },

    /// Declared value is negative or more precise than the currency allows.
    #[error("invalid declared value: {value}")]
    InvalidDeclaredValue {
        /// The rejected value.
        value: Decimal,
    },

    /// Another entry already uses this service code.
    #[error("service code already exists: {code}")]
    DuplicateServiceCode {
        /// The duplicated code.
        code: String,
    },

    /// Another active entry already prices this category and class.
    #[error("active service {existing} already covers category={category} class={}", display_class(.class_code))]
    DuplicateServiceScope {
        /// The category.
        category: String,
        /// The class scope (`None` for flat services).
        class_code: Option<ClassCode>,
        /// The code of the entry already holding the scope.
        existing: String,
    },

    /// No entry with this code exists in the catalog.
    #[error("service not found: {code}")]
    ServiceNotFound {
        /// The missing code.
        code: String,
    },

    /// A service entry failed validation.
    #[error("invalid service entry: {0}")]
    InvalidServiceEntry(String),

    /// A promo code failed validation.
    #[error("invalid promo code: {0}")]
    InvalidPromo(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}

impl BillingError {
    /// Whether this error rejects a promo code rather than the charge itself.
    ///
    /// Callers fall back to the undiscounted subtotal on these.
    #[must_use]
    pub const fn is_promo_rejection(&self) -> bool {
        matches!(
            self,
            Self::PromoExpired { .. }
                | Self::PromoExhausted { .. }
                | Self::PromoNotActive { .. }
                | Self::PromoScopeMismatch { .. }
        )
    }

    /// Stable machine-readable code for this error kind.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NoMatchingService { .. } => "no_matching_service",
            Self::RateUnset { .. } => "rate_unset",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::PromoExpired { .. } => "promo_expired",
            Self::PromoExhausted { .. } => "promo_exhausted",
            Self::PromoNotActive { .. } => "promo_not_active",
            Self::PromoScopeMismatch { .. } => "promo_scope_mismatch",
            Self::CoverageDisabled => "coverage_disabled",
            Self::CoverageNotApplicable { .. } => "coverage_not_applicable",
            Self::InvalidDeclaredValue { .. } => "invalid_declared_value",
            Self::DuplicateServiceCode { .. } => "duplicate_service_code",
            Self::DuplicateServiceScope { .. } => "duplicate_service_scope",
            Self::ServiceNotFound { .. } => "service_not_found",
            Self::InvalidServiceEntry(_) => "invalid_service_entry",
            Self::InvalidPromo(_) => "invalid_promo",
            Self::InvalidId(_) => "invalid_id",
        }
    }
}

fn display_class(class_code: &Option<ClassCode>) -> &'static str {
    class_code.map_or("any", ClassCode::as_str)
}
