//! Core types and rate computation for tally.
//!
//! This crate holds the billing logic of the warehouse platform, as pure
//! functions over immutable snapshots supplied by the caller:
//!
//! - **Catalog**: `ServiceCatalog`, `ServiceEntry`, `ClassCode`
//! - **Resolution**: `resolve`, `ChargeContext`, `ResolutionTier`
//! - **Charges**: `compute`, `ComputedCharge`
//! - **Promos**: `PromoCode`, `preview`, `RedemptionDecision`
//! - **Coverage**: `CoverageConfig`, `compute_premium`
//! - **Quotes**: `quote`, `QuoteRequest`, `ChargeQuote`
//!
//! # Money
//!
//! Amounts are `rust_decimal::Decimal` with at most two fractional digits.
//! More precise inputs are rejected rather than truncated, and products are
//! rounded half-up once, at the end. Nothing here reads the clock: callers
//! pass `now` explicitly.
//!
//! # No implicit zero
//!
//! A missing service, an unset rate, or disabled coverage is always an error.
//! The only zero charge is a zero quantity, which means "not yet billable".

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod charge;
pub mod coverage;
pub mod error;
pub mod ids;
pub mod money;
pub mod promo;
pub mod quote;
pub mod resolver;
pub mod settings;

pub use catalog::{
    normalize_code, BillingTrigger, BillingUnit, ClassCode, ServiceCatalog, ServiceEntry,
};
pub use charge::{compute, ComputedCharge, RateSource};
pub use coverage::{
    compute_premium, compute_premium_for_level, CoverageConfig, CoverageLevel, CoverageType,
};
pub use error::{BillingError, Result};
pub use ids::{IdError, RedemptionId, TenantId};
pub use money::{ensure_amount, round_currency, CURRENCY_SCALE};
pub use promo::{
    preview, DiscountPreview, DiscountType, PromoCode, PromoExpiration, RedemptionDecision,
    ServiceScope, UsageLimit,
};
pub use quote::{quote, ChargeQuote, CoverageRequest, PromoRejection, QuoteRequest};
pub use resolver::{resolve, ChargeContext, Resolution, ResolutionTier};
pub use settings::TenantBillingSettings;
