//! Valuation coverage premiums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::money::{has_currency_precision, round_currency};

/// Coverage a customer can choose for declared goods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageType {
    /// Statutory per-weight liability; priced elsewhere, no premium here.
    Standard,
    /// Full replacement value with no deductible.
    FullNoDeductible,
    /// Full replacement value subject to a deductible at claim time.
    FullWithDeductible,
}

/// Where coverage is being priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageLevel {
    /// A single stored item.
    Item,
    /// A whole shipment.
    Shipment,
}

impl CoverageLevel {
    /// Get the level name as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Shipment => "shipment",
        }
    }
}

/// A tenant's coverage rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageConfig {
    /// Whether full-value coverage is offered at all.
    pub enabled: bool,

    /// Type preselected for new items and shipments.
    pub default_type: CoverageType,

    /// Premium per unit of declared value, no deductible (e.g. `0.0188`).
    pub rate_no_deductible: Decimal,

    /// Premium per unit of declared value, with deductible (e.g. `0.0142`).
    pub rate_with_deductible: Decimal,

    /// Deductible applied at claim time; never reduces the premium.
    pub deductible_amount: Decimal,

    /// Coverage can be set on individual items.
    pub applies_to_items: bool,

    /// Coverage can be set on shipments.
    pub applies_to_shipments: bool,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            default_type: CoverageType::Standard,
            rate_no_deductible: Decimal::ZERO,
            rate_with_deductible: Decimal::ZERO,
            deductible_amount: Decimal::ZERO,
            applies_to_items: true,
            applies_to_shipments: true,
        }
    }
}

impl CoverageConfig {
    /// Whether coverage can be set at `level`.
    #[must_use]
    pub const fn applies_to(&self, level: CoverageLevel) -> bool {
        match level {
            CoverageLevel::Item => self.applies_to_items,
            CoverageLevel::Shipment => self.applies_to_shipments,
        }
    }

    /// Check the rate table.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidAmount` for a negative rate or a
    /// negative or overly precise deductible.
    pub fn validate(&self) -> Result<()> {
        for (field, rate) in [
            ("rate_no_deductible", self.rate_no_deductible),
            ("rate_with_deductible", self.rate_with_deductible),
        ] {
            if rate < Decimal::ZERO {
                return Err(BillingError::InvalidAmount {
                    field: field.to_string(),
                    value: rate,
                });
            }
        }
        crate::money::ensure_amount("deductible_amount", self.deductible_amount)?;
        Ok(())
    }
}

/// Premium for covering `declared_value` under `coverage_type`.
///
/// # Errors
///
/// - `BillingError::InvalidDeclaredValue` if the value is negative, too precise,
///   or so large the premium does not fit a `Decimal`.
/// - `BillingError::CoverageDisabled` if a full-value type is requested while
///   coverage is disabled.
pub fn compute_premium(
    config: &CoverageConfig,
    declared_value: Decimal,
    coverage_type: CoverageType,
) -> Result<Decimal> {
    if declared_value < Decimal::ZERO || !has_currency_precision(declared_value) {
        return Err(BillingError::InvalidDeclaredValue {
            value: declared_value,
        });
    }

    let rate = match coverage_type {
        CoverageType::Standard => return Ok(round_currency(Decimal::ZERO)),
        _ if !config.enabled => return Err(BillingError::CoverageDisabled),
        CoverageType::FullNoDeductible => config.rate_no_deductible,
        CoverageType::FullWithDeductible => config.rate_with_deductible,
    };

    declared_value
        .checked_mul(rate)
        .map(round_currency)
        .ok_or(BillingError::InvalidDeclaredValue {
            value: declared_value,
        })
}

/// Like [`compute_premium`], but also checks the tenant offers coverage at `level`.
///
/// # Errors
///
/// Returns `BillingError::CoverageNotApplicable` for a full-value type at a
/// level the tenant does not cover, plus everything [`compute_premium`] returns.
pub fn compute_premium_for_level(
    config: &CoverageConfig,
    level: CoverageLevel,
    declared_value: Decimal,
    coverage_type: CoverageType,
) -> Result<Decimal> {
    if coverage_type != CoverageType::Standard && config.enabled && !config.applies_to(level) {
        return Err(BillingError::CoverageNotApplicable {
            level: level.as_str().to_string(),
        });
    }
    compute_premium(config, declared_value, coverage_type)
}
