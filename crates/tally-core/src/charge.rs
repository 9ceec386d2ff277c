//! Charge computation.
//!
//! Turns a resolved service and a quantity into an amount. All arithmetic is
//! decimal; the product is rounded once, after multiplication.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{BillingUnit, ServiceEntry};
use crate::error::{BillingError, Result};
use crate::money::{ensure_amount, ensure_optional_amount, round_currency};

/// Where the unit rate of a charge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// The catalog entry's configured rate.
    Catalog,
    /// A rate entered for this task by an operator.
    Override,
}

/// The result of pricing one charge line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedCharge {
    /// Code of the service charged.
    pub service_code: String,

    /// Rate per billing unit that was applied.
    pub unit_rate: Decimal,

    /// Whether `unit_rate` came from the catalog or an override.
    pub rate_source: RateSource,

    /// Billable quantity.
    pub quantity: Decimal,

    /// Unit the quantity is counted in.
    pub billing_unit: BillingUnit,

    /// Whether the charge is taxable.
    pub taxable: bool,

    /// `unit_rate × quantity`, rounded to currency precision.
    pub raw_amount: Decimal,

    /// Whether the minimum charge replaced `raw_amount`.
    pub minimum_applied: bool,

    /// Amount to bill.
    pub final_amount: Decimal,
}

impl ComputedCharge {
    /// Whether the charge is billable yet (zero quantity is not).
    #[must_use]
    pub fn is_billable(&self) -> bool {
        !self.quantity.is_zero()
    }
}

/// Price `quantity` units of `service`.
///
/// `override_rate` takes precedence over the catalog rate. A zero quantity
/// yields a zero charge ("not yet billable") whatever the rate, but only
/// once a rate exists: an unset rate is always an error.
///
/// # Errors
///
/// - `BillingError::RateUnset` if neither an override nor a catalog rate exists.
/// - `BillingError::InvalidQuantity` if `quantity` is negative or so large the
///   amount does not fit a `Decimal`.
/// - `BillingError::InvalidAmount` if a rate or `minimum_charge` is negative or
///   more precise than the currency allows.
pub fn compute(
    service: &ServiceEntry,
    quantity: Decimal,
    override_rate: Option<Decimal>,
    minimum_charge: Option<Decimal>,
) -> Result<ComputedCharge> {
    let (unit_rate, rate_source) = match (override_rate, service.rate) {
        (Some(rate), _) => (ensure_amount("override_rate", rate)?, RateSource::Override),
        (None, Some(rate)) => (ensure_amount("rate", rate)?, RateSource::Catalog),
        (None, None) => {
            return Err(BillingError::RateUnset {
                service_code: service.code.clone(),
            })
        }
    };

    if quantity < Decimal::ZERO {
        return Err(BillingError::InvalidQuantity { quantity });
    }
    let minimum_charge = ensure_optional_amount("minimum_charge", minimum_charge)?;

    let mut charge = ComputedCharge {
        service_code: service.code.clone(),
        unit_rate,
        rate_source,
        quantity,
        billing_unit: service.billing_unit,
        taxable: service.taxable,
        raw_amount: round_currency(Decimal::ZERO),
        minimum_applied: false,
        final_amount: round_currency(Decimal::ZERO),
    };

    if quantity.is_zero() {
        return Ok(charge);
    }

    let raw = unit_rate
        .checked_mul(quantity)
        .ok_or(BillingError::InvalidQuantity { quantity })?;
    charge.raw_amount = round_currency(raw);
    charge.final_amount = charge.raw_amount;

    if let Some(minimum) = minimum_charge {
        if charge.raw_amount < minimum {
            charge.final_amount = round_currency(minimum);
            charge.minimum_applied = true;
        }
    }

    Ok(charge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BillingTrigger;
    use rust_decimal_macros::dec;

    fn assembly() -> ServiceEntry {
        ServiceEntry::new(
            "ASSEMBLY_60",
            "Assembly (60 min)",
            "assembly",
            BillingUnit::PerTask,
            BillingTrigger::ThroughTask,
        )
        .with_rate(dec!(45.00))
    }

    #[test]
    fn multiplies_rate_by_quantity() {
        let charge = compute(&assembly(), dec!(2), None, None).unwrap();
        assert_eq!(charge.final_amount, dec!(90.00));
        assert_eq!(charge.raw_amount, dec!(90.00));
        assert_eq!(charge.rate_source, RateSource::Catalog);
        assert!(!charge.minimum_applied);
    }

    #[test]
    fn override_rate_takes_precedence() {
        let charge = compute(&assembly(), dec!(1), Some(dec!(50.00)), None).unwrap();
        assert_eq!(charge.final_amount, dec!(50.00));
        assert_eq!(charge.unit_rate, dec!(50.00));
        assert_eq!(charge.rate_source, RateSource::Override);
    }

    #[test]
    fn zero_quantity_is_not_billable() {
        let charge = compute(&assembly(), Decimal::ZERO, Some(dec!(80.00)), Some(dec!(25.00)))
            .unwrap();
        assert_eq!(charge.final_amount, Decimal::ZERO);
        assert!(!charge.minimum_applied);
        assert!(!charge.is_billable());
    }

    #[test]
    fn unset_rate_is_an_error() {
        let mut service = assembly();
        service.rate = None;

        let err = compute(&service, dec!(3), None, None).unwrap_err();
        assert_eq!(
            err,
            BillingError::RateUnset {
                service_code: "ASSEMBLY_60".into()
            }
        );
    }

    #[test]
    fn unset_rate_is_an_error_even_at_zero_quantity() {
        let mut service = assembly();
        service.rate = None;
        assert!(matches!(
            compute(&service, Decimal::ZERO, None, None),
            Err(BillingError::RateUnset { .. })
        ));
    }

    #[test]
    fn unset_rate_with_override_computes() {
        let mut service = assembly();
        service.rate = None;
        let charge = compute(&service, dec!(2), Some(dec!(12.50)), None).unwrap();
        assert_eq!(charge.final_amount, dec!(25.00));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = compute(&assembly(), dec!(-1), None, None).unwrap_err();
        assert_eq!(err, BillingError::InvalidQuantity { quantity: dec!(-1) });
    }

    #[test]
    fn minimum_charge_floors_small_amounts() {
        let charge = compute(&assembly(), dec!(0.25), None, Some(dec!(20.00))).unwrap();
        assert_eq!(charge.raw_amount, dec!(11.25));
        assert_eq!(charge.final_amount, dec!(20.00));
        assert!(charge.minimum_applied);
    }

    #[test]
    fn minimum_charge_below_raw_is_ignored() {
        let charge = compute(&assembly(), dec!(1), None, Some(dec!(20.00))).unwrap();
        assert_eq!(charge.final_amount, dec!(45.00));
        assert!(!charge.minimum_applied);
    }

    #[test]
    fn fractional_quantities_round_once_half_up() {
        let service = assembly().with_rate(dec!(0.15));
        // 0.15 × 2.5 = 0.375 → 0.38
        let charge = compute(&service, dec!(2.5), None, None).unwrap();
        assert_eq!(charge.final_amount, dec!(0.38));
    }

    #[test]
    fn overly_precise_inputs_are_rejected() {
        assert!(matches!(
            compute(&assembly(), dec!(1), Some(dec!(10.001)), None),
            Err(BillingError::InvalidAmount { .. })
        ));
        assert!(matches!(
            compute(&assembly(), dec!(1), None, Some(dec!(5.555))),
            Err(BillingError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn overflowing_quantity_is_rejected() {
        assert_eq!(
            compute(&assembly(), Decimal::MAX, None, None),
            Err(BillingError::InvalidQuantity {
                quantity: Decimal::MAX
            })
        );
    }

    #[test]
    fn amounts_carry_two_digits() {
        let service = assembly().with_rate(dec!(45));
        let charge = compute(&service, dec!(2), None, None).unwrap();
        assert_eq!(charge.final_amount.to_string(), "90.00");
    }
}
