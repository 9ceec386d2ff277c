//! Currency helpers.
//!
//! Amounts are `Decimal` values with at most two fractional digits. Inputs
//! with more precision are rejected, never truncated. Products are rounded
//! half-up once, at the end of a computation.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BillingError, Result};

/// Fractional digits the currency allows.
pub const CURRENCY_SCALE: u32 = 2;

/// Whether `value` fits the currency's precision.
#[must_use]
pub fn has_currency_precision(value: Decimal) -> bool {
    value.normalize().scale() <= CURRENCY_SCALE
}

/// Validate a non-negative currency amount.
///
/// # Errors
///
/// Returns `BillingError::InvalidAmount` if `value` is negative or has more
/// than two fractional digits.
pub fn ensure_amount(field: &str, value: Decimal) -> Result<Decimal> {
    if value < Decimal::ZERO || !has_currency_precision(value) {
        return Err(BillingError::InvalidAmount {
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}

/// Validate an optional currency amount.
///
/// # Errors
///
/// See [`ensure_amount`].
pub fn ensure_optional_amount(field: &str, value: Option<Decimal>) -> Result<Option<Decimal>> {
    value.map(|v| ensure_amount(field, v)).transpose()
}

/// Round to currency precision, half away from zero, always carrying two
/// fractional digits.
#[must_use]
pub fn round_currency(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CURRENCY_SCALE);
    rounded
}
