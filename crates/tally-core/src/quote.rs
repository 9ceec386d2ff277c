//! End-to-end charge quotes.
//!
//! A quote strings the components together: resolve the service, compute the
//! charge, optionally discount it with a promo code, and optionally add a
//! coverage premium. A rejected promo does not fail the quote; the quote keeps
//! the undiscounted subtotal and says why the code was refused.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::ServiceCatalog;
use crate::charge::{compute, ComputedCharge};
use crate::coverage::{compute_premium_for_level, CoverageLevel, CoverageType};
use crate::error::{BillingError, Result};
use crate::money::round_currency;
use crate::promo::{preview, DiscountPreview, PromoCode};
use crate::resolver::{resolve, ChargeContext, ResolutionTier};
use crate::settings::TenantBillingSettings;

/// Everything needed to price one operational event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// What is being charged for.
    pub context: ChargeContext,

    /// Billable quantity in the service's billing unit.
    pub quantity: Decimal,

    /// Operator-entered rate for this task.
    #[serde(default)]
    pub override_rate: Option<Decimal>,

    /// Minimum charge; falls back to the tenant default.
    #[serde(default)]
    pub minimum_charge: Option<Decimal>,

    /// Valuation coverage to add, if any.
    #[serde(default)]
    pub coverage: Option<CoverageRequest>,
}

impl QuoteRequest {
    /// Quote `quantity` units for `context` with no override, minimum or coverage.
    #[must_use]
    pub fn new(context: ChargeContext, quantity: Decimal) -> Self {
        Self {
            context,
            quantity,
            override_rate: None,
            minimum_charge: None,
            coverage: None,
        }
    }
}

/// Coverage part of a quote request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRequest {
    /// Item or shipment coverage.
    pub level: CoverageLevel,

    /// Declared value of the goods.
    pub declared_value: Decimal,

    /// Chosen coverage; the tenant's default when absent.
    #[serde(default)]
    pub coverage_type: Option<CoverageType>,
}

/// Why a promo code was not applied to a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRejection {
    /// The code that was refused.
    pub promo_code: String,
    /// Machine-readable reason (e.g. `promo_expired`).
    pub reason: String,
    /// Human-readable message.
    pub message: String,
}

/// A priced charge.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct ChargeQuote {
    /// The computed charge line.
    pub charge: ComputedCharge,

    /// Which resolver tier picked the service.
    pub resolution_tier: ResolutionTier,

    /// Discount applied, if a promo code was given and accepted.
    pub discount: Option<DiscountPreview>,

    /// Why the promo code was refused, if it was.
    pub promo_rejection: Option<PromoRejection>,

    /// Charge after discount.
    pub subtotal: Decimal,

    /// Coverage premium (zero without coverage).
    pub premium: Decimal,

    /// `subtotal + premium`.
    pub total: Decimal,
}

/// Price `request` against a tenant's catalog and settings.
///
/// # Errors
///
/// Resolver, calculator and coverage errors fail the quote, as does a total
/// too large for a `Decimal` (`BillingError::InvalidAmount`). Promo errors are
/// reported in [`ChargeQuote::promo_rejection`] instead.
pub fn quote(
    request: &QuoteRequest,
    catalog: &ServiceCatalog,
    settings: &TenantBillingSettings,
    promo: Option<&PromoCode>,
    now: DateTime<Utc>,
) -> Result<ChargeQuote> {
    let resolution = resolve(&request.context, catalog.entries())?;

    let minimum_charge = request
        .minimum_charge
        .or(settings.default_minimum_charge);
    let charge = compute(
        resolution.entry,
        request.quantity,
        request.override_rate,
        minimum_charge,
    )?;

    let (discount, promo_rejection) = match promo {
        None => (None, None),
        Some(promo) => match preview(
            promo,
            charge.final_amount,
            &[charge.service_code.as_str()],
            now,
        ) {
            Ok(preview) => (Some(preview), None),
            Err(err) if err.is_promo_rejection() => (None, Some(PromoRejection::from(&err))),
            Err(err) => return Err(err),
        },
    };

    let subtotal = discount
        .as_ref()
        .map_or(charge.final_amount, |d| d.discounted_amount);

    let premium = match &request.coverage {
        None => round_currency(Decimal::ZERO),
        Some(coverage) => compute_premium_for_level(
            &settings.coverage,
            coverage.level,
            coverage.declared_value,
            coverage
                .coverage_type
                .unwrap_or(settings.coverage.default_type),
        )?,
    };

    let total = subtotal
        .checked_add(premium)
        .map(round_currency)
        .ok_or_else(|| BillingError::InvalidAmount {
            field: "total".to_string(),
            value: subtotal,
        })?;

    Ok(ChargeQuote {
        resolution_tier: resolution.tier,
        total,
        charge,
        discount,
        promo_rejection,
        subtotal,
        premium,
    })
}

impl ChargeQuote {
    /// Whether the quote would bill anything.
    #[must_use]
    pub fn is_billable(&self) -> bool {
        self.charge.is_billable()
    }
}

impl From<&BillingError> for PromoRejection {
    fn from(err: &BillingError) -> Self {
        let promo_code = match err {
            BillingError::PromoExpired { code }
            | BillingError::PromoExhausted { code }
            | BillingError::PromoNotActive { code }
            | BillingError::PromoScopeMismatch { code } => code.clone(),
            _ => String::new(),
        };
        Self {
            promo_code,
            reason: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BillingTrigger, BillingUnit, ClassCode, ServiceEntry};
    use crate::coverage::CoverageConfig;
    use crate::promo::DiscountType;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 9, 30, 0).unwrap()
    }

    fn catalog() -> ServiceCatalog {
        ServiceCatalog::from_entries([
            ServiceEntry::new(
                "ASSEMBLY_60",
                "Assembly (60 min)",
                "assembly",
                BillingUnit::PerTask,
                BillingTrigger::ThroughTask,
            )
            .with_rate(dec!(45.00)),
            ServiceEntry::new(
                "RCV_M",
                "Receiving M",
                "receiving",
                BillingUnit::PerItem,
                BillingTrigger::ScanEvent,
            )
            .with_class(ClassCode::M)
            .with_rate(dec!(6.00)),
        ])
        .unwrap()
    }

    fn settings() -> TenantBillingSettings {
        TenantBillingSettings {
            coverage: CoverageConfig {
                enabled: true,
                default_type: CoverageType::FullWithDeductible,
                rate_no_deductible: dec!(0.0188),
                rate_with_deductible: dec!(0.0142),
                deductible_amount: dec!(300.00),
                applies_to_items: true,
                applies_to_shipments: true,
            },
            default_minimum_charge: None,
        }
    }

    #[test]
    fn plain_quote() {
        let request = QuoteRequest::new(ChargeContext::new("assembly"), dec!(2));
        let quote = quote(&request, &catalog(), &settings(), None, now()).unwrap();

        assert_eq!(quote.charge.service_code, "ASSEMBLY_60");
        assert_eq!(quote.resolution_tier, ResolutionTier::ClassAgnostic);
        assert_eq!(quote.subtotal, dec!(90.00));
        assert_eq!(quote.premium, Decimal::ZERO);
        assert_eq!(quote.total, dec!(90.00));
    }

    #[test]
    fn promo_and_coverage_add_up() {
        let promo =
            PromoCode::new("SUMMER25", DiscountType::Percentage, dec!(25), now()).unwrap();
        let mut request = QuoteRequest::new(ChargeContext::new("assembly"), dec!(2));
        request.coverage = Some(CoverageRequest {
            level: CoverageLevel::Item,
            declared_value: dec!(10000),
            coverage_type: None,
        });

        let quote = quote(&request, &catalog(), &settings(), Some(&promo), now()).unwrap();

        assert_eq!(quote.discount.as_ref().unwrap().discounted_amount, dec!(67.50));
        assert_eq!(quote.subtotal, dec!(67.50));
        assert_eq!(quote.premium, dec!(142.00));
        assert_eq!(quote.total, dec!(209.50));
        assert!(quote.promo_rejection.is_none());
    }

    #[test]
    fn rejected_promo_falls_back_to_undiscounted_subtotal() {
        let promo = PromoCode::new("OLD", DiscountType::FlatRate, dec!(10.00), now())
            .unwrap()
            .expiring_at(now() - Duration::days(30));
        let request = QuoteRequest::new(ChargeContext::new("assembly"), dec!(1));

        let quote = quote(&request, &catalog(), &settings(), Some(&promo), now()).unwrap();

        assert!(quote.discount.is_none());
        assert_eq!(quote.subtotal, dec!(45.00));
        let rejection = quote.promo_rejection.unwrap();
        assert_eq!(rejection.promo_code, "OLD");
        assert_eq!(rejection.reason, "promo_expired");
    }

    #[test]
    fn tenant_minimum_applies_when_request_has_none() {
        let mut settings = settings();
        settings.default_minimum_charge = Some(dec!(25.00));
        let request = QuoteRequest::new(
            ChargeContext::new("receiving").with_class(ClassCode::M),
            dec!(1),
        );

        let quote = quote(&request, &catalog(), &settings, None, now()).unwrap();
        assert!(quote.charge.minimum_applied);
        assert_eq!(quote.total, dec!(25.00));
    }

    #[test]
    fn request_minimum_overrides_tenant_default() {
        let mut settings = settings();
        settings.default_minimum_charge = Some(dec!(25.00));
        let mut request = QuoteRequest::new(
            ChargeContext::new("receiving").with_class(ClassCode::M),
            dec!(1),
        );
        request.minimum_charge = Some(dec!(5.00));

        let quote = quote(&request, &catalog(), &settings, None, now()).unwrap();
        assert!(!quote.charge.minimum_applied);
        assert_eq!(quote.total, dec!(6.00));
    }

    #[test]
    fn unresolvable_context_fails() {
        let request = QuoteRequest::new(ChargeContext::new("stocktake"), dec!(1));
        assert!(matches!(
            quote(&request, &catalog(), &settings(), None, now()),
            Err(BillingError::NoMatchingService { .. })
        ));
    }

    #[test]
    fn coverage_errors_fail_the_quote() {
        let mut settings = settings();
        settings.coverage.enabled = false;
        let mut request = QuoteRequest::new(ChargeContext::new("assembly"), dec!(1));
        request.coverage = Some(CoverageRequest {
            level: CoverageLevel::Shipment,
            declared_value: dec!(500),
            coverage_type: Some(CoverageType::FullNoDeductible),
        });

        assert_eq!(
            quote(&request, &catalog(), &settings, None, now()),
            Err(BillingError::CoverageDisabled)
        );
    }

    #[test]
    fn total_overflow_is_an_error() {
        let huge = Decimal::MAX.trunc() - dec!(1);
        let catalog = ServiceCatalog::from_entries([ServiceEntry::new(
            "BULK",
            "Bulk handling",
            "bulk",
            BillingUnit::PerItem,
            BillingTrigger::ScanEvent,
        )
        .with_rate(dec!(1.00))])
        .unwrap();
        let mut settings = settings();
        settings.coverage.rate_no_deductible = dec!(1);
        let mut request = QuoteRequest::new(ChargeContext::new("bulk"), huge);
        request.coverage = Some(CoverageRequest {
            level: CoverageLevel::Item,
            declared_value: huge,
            coverage_type: Some(CoverageType::FullNoDeductible),
        });

        assert!(matches!(
            quote(&request, &catalog, &settings, None, now()),
            Err(BillingError::InvalidAmount { field, .. }) if field == "total"
        ));
    }

    #[test]
    fn overflowing_quantity_fails_the_quote() {
        let request = QuoteRequest::new(ChargeContext::new("assembly"), Decimal::MAX);
        assert!(matches!(
            quote(&request, &catalog(), &settings(), None, now()),
            Err(BillingError::InvalidQuantity { .. })
        ));
    }

    #[test]
    fn rejection_from_error_extracts_code() {
        let rejection = PromoRejection::from(&BillingError::PromoExhausted {
            code: "ONCE".into(),
        });
        assert_eq!(rejection.promo_code, "ONCE");
        assert_eq!(rejection.reason, "promo_exhausted");
    }
}
