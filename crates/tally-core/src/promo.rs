//! Promo codes and discount application.
//!
//! Discounts are applied in two steps. [`preview`] validates a code against a
//! subtotal and computes the discount without touching usage state. A
//! [`DiscountPreview`] can then be turned into a [`RedemptionDecision`] that the
//! promo store commits. Neither is `Clone` and each step consumes the previous
//! one, so a single preview can be redeemed at most once.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::normalize_code;
use crate::error::{BillingError, Result};
use crate::ids::RedemptionId;
use crate::money::{ensure_amount, round_currency};

/// Largest percentage discount.
const MAX_PERCENTAGE: Decimal = Decimal::ONE_HUNDRED;

/// How a promo code discounts a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `discount_value` percent off.
    Percentage,
    /// `discount_value` currency units off.
    FlatRate,
}

/// When a promo code stops being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "at")]
pub enum PromoExpiration {
    /// Never expires.
    None,
    /// Expires after the given instant.
    Date(DateTime<Utc>),
}

/// Which services a promo code discounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "services")]
pub enum ServiceScope {
    /// Every service.
    All,
    /// Only the listed service codes.
    Selected(BTreeSet<String>),
}

impl ServiceScope {
    /// Scope restricted to `codes` (normalized).
    #[must_use]
    pub fn selected<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Selected(codes.into_iter().map(|c| normalize_code(c.as_ref())).collect())
    }

    /// Whether any of `service_codes` falls in scope.
    #[must_use]
    pub fn covers_any<S: AsRef<str>>(&self, service_codes: &[S]) -> bool {
        match self {
            Self::All => true,
            Self::Selected(selected) => service_codes.iter().any(|code| {
                let code = normalize_code(code.as_ref());
                selected.contains(&code)
            }),
        }
    }
}

/// How many times a promo code may be redeemed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "limit")]
pub enum UsageLimit {
    /// No cap.
    Unlimited,
    /// At most this many redemptions.
    Limited(u32),
}

/// An administrator-issued discount code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoCode {
    /// The code, upper-case. Immutable after creation.
    pub code: String,

    /// Percentage or flat discount.
    pub discount_type: DiscountType,

    /// Percent (0–100) or currency amount, depending on `discount_type`.
    pub discount_value: Decimal,

    /// Expiration rule.
    pub expiration: PromoExpiration,

    /// Services the code applies to.
    pub service_scope: ServiceScope,

    /// Redemption cap.
    pub usage_limit: UsageLimit,

    /// Committed redemptions so far.
    #[serde(default)]
    pub times_used: u32,

    /// Administrator switch.
    pub active: bool,

    /// When the code was created.
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Create an active, unlimited, non-expiring code that applies to all services.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidPromo` or `BillingError::InvalidAmount`
    /// if the code or discount value is invalid.
    pub fn new(
        code: &str,
        discount_type: DiscountType,
        discount_value: Decimal,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let promo = Self {
            code: normalize_code(code),
            discount_type,
            discount_value,
            expiration: PromoExpiration::None,
            service_scope: ServiceScope::All,
            usage_limit: UsageLimit::Unlimited,
            times_used: 0,
            active: true,
            created_at,
        };
        promo.validate()?;
        Ok(promo)
    }

    /// Set an expiration instant.
    #[must_use]
    pub fn expiring_at(mut self, at: DateTime<Utc>) -> Self {
        self.expiration = PromoExpiration::Date(at);
        self
    }

    /// Restrict the code to the given services.
    #[must_use]
    pub fn for_services<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.service_scope = ServiceScope::selected(codes);
        self
    }

    /// Cap the number of redemptions.
    #[must_use]
    pub fn limited_to(mut self, uses: u32) -> Self {
        self.usage_limit = UsageLimit::Limited(uses);
        self
    }

    /// Check the creation-time invariants.
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidPromo` for a blank or malformed code, a
    ///   percentage outside 0–100, a zero usage cap, or an empty selection.
    /// - `BillingError::InvalidAmount` for a negative or overly precise flat value.
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(BillingError::InvalidPromo("code is required".into()));
        }
        if !self
            .code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(BillingError::InvalidPromo(format!(
                "{}: code may only contain letters, digits, '-' and '_'",
                self.code
            )));
        }

        match self.discount_type {
            DiscountType::Percentage => {
                if self.discount_value < Decimal::ZERO || self.discount_value > MAX_PERCENTAGE {
                    return Err(BillingError::InvalidPromo(format!(
                        "{}: percentage must be between 0 and 100, got {}",
                        self.code, self.discount_value
                    )));
                }
            }
            DiscountType::FlatRate => {
                ensure_amount("discount_value", self.discount_value)?;
            }
        }

        if self.usage_limit == UsageLimit::Limited(0) {
            return Err(BillingError::InvalidPromo(format!(
                "{}: usage limit must be at least 1",
                self.code
            )));
        }
        if matches!(&self.service_scope, ServiceScope::Selected(s) if s.is_empty()) {
            return Err(BillingError::InvalidPromo(format!(
                "{}: selected scope needs at least one service",
                self.code
            )));
        }

        Ok(())
    }

    /// Whether `code` names this promo (case-insensitive).
    #[must_use]
    pub fn matches(&self, code: &str) -> bool {
        self.code == normalize_code(code)
    }

    /// Redemptions left; `None` when unlimited.
    #[must_use]
    pub fn uses_remaining(&self) -> Option<u32> {
        match self.usage_limit {
            UsageLimit::Unlimited => None,
            UsageLimit::Limited(limit) => Some(limit.saturating_sub(self.times_used)),
        }
    }

    /// Whether the code has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expiration, PromoExpiration::Date(at) if now > at)
    }

    /// Whether the code could be redeemed at `now`, ignoring service scope.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.check_usable(now).is_ok()
    }

    /// Apply one committed redemption.
    ///
    /// This is the state transition the promo store performs atomically.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::PromoExhausted` if no uses remain.
    pub fn record_redemption(&mut self) -> Result<()> {
        if self.uses_remaining() == Some(0) {
            return Err(BillingError::PromoExhausted {
                code: self.code.clone(),
            });
        }
        self.times_used = self.times_used.saturating_add(1);
        Ok(())
    }

    fn check_usable(&self, now: DateTime<Utc>) -> Result<()> {
        if self.is_expired_at(now) {
            return Err(BillingError::PromoExpired {
                code: self.code.clone(),
            });
        }
        if self.uses_remaining() == Some(0) {
            return Err(BillingError::PromoExhausted {
                code: self.code.clone(),
            });
        }
        if !self.active {
            return Err(BillingError::PromoNotActive {
                code: self.code.clone(),
            });
        }
        Ok(())
    }
}

/// A validated, computed discount that has not been redeemed.
///
/// Not `Clone`, so one preview yields at most one redemption:
///
/// ```compile_fail
/// use chrono::Utc;
/// use rust_decimal::Decimal;
/// use tally_core::{preview, DiscountType, PromoCode, RedemptionId};
///
/// let now = Utc::now();
/// let promo = PromoCode::new("SAVE10", DiscountType::FlatRate, Decimal::new(1000, 2), now)?;
/// let discount = preview(&promo, Decimal::new(10000, 2), &["ASSEMBLY_60"], now)?;
/// let first = discount.clone().into_redemption(RedemptionId::at(now));
/// let second = discount.into_redemption(RedemptionId::at(now));
/// # Ok::<(), tally_core::BillingError>(())
/// ```
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct DiscountPreview {
    /// The promo code applied.
    pub code: String,

    /// Subtotal before discount.
    pub subtotal: Decimal,

    /// Amount taken off.
    pub discount_amount: Decimal,

    /// Subtotal after discount, never below zero.
    pub discounted_amount: Decimal,

    /// `times_used` observed when the preview was made.
    #[serde(skip)]
    observed_uses: u32,

    /// Instant the promo was checked at.
    #[serde(skip)]
    evaluated_at: DateTime<Utc>,
}

impl DiscountPreview {
    /// Instant the promo was checked at.
    #[must_use]
    pub const fn evaluated_at(&self) -> DateTime<Utc> {
        self.evaluated_at
    }
}

impl DiscountPreview {
    /// Turn the preview into a commit instruction for the promo store.
    #[must_use]
    pub fn into_redemption(self, redemption_id: RedemptionId) -> RedemptionDecision {
        RedemptionDecision {
            redemption_id,
            code: self.code.clone(),
            observed_uses: self.observed_uses,
            preview: self,
        }
    }
}

/// An instruction to consume one use of a promo code.
///
/// Not `Clone`: committing takes it by value, so the same preview cannot be
/// committed twice from one caller.
#[derive(Debug, PartialEq, Eq)]
pub struct RedemptionDecision {
    redemption_id: RedemptionId,
    code: String,
    observed_uses: u32,
    preview: DiscountPreview,
}

impl RedemptionDecision {
    /// Idempotency key of the redemption.
    #[must_use]
    pub const fn redemption_id(&self) -> RedemptionId {
        self.redemption_id
    }

    /// The promo code to consume.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// `times_used` the decision was computed against.
    #[must_use]
    pub const fn observed_uses(&self) -> u32 {
        self.observed_uses
    }

    /// Instant the preview was computed at; the store re-checks expiry
    /// against it.
    #[must_use]
    pub const fn evaluated_at(&self) -> DateTime<Utc> {
        self.preview.evaluated_at
    }

    /// The discount being redeemed.
    #[must_use]
    pub const fn preview(&self) -> &DiscountPreview {
        &self.preview
    }

    /// Unwrap the discount once the commit has succeeded.
    #[must_use]
    pub fn into_preview(self) -> DiscountPreview {
        self.preview
    }
}

/// Validate `promo` and compute its discount on `subtotal` without touching usage.
///
/// Checks run in order: expiration, exhaustion, active flag, service scope.
///
/// # Errors
///
/// - `BillingError::PromoExpired`, `PromoExhausted`, `PromoNotActive`,
///   `PromoScopeMismatch` when the code cannot be applied.
/// - `BillingError::InvalidAmount` if `subtotal` is negative or too precise.
pub fn preview<S: AsRef<str>>(
    promo: &PromoCode,
    subtotal: Decimal,
    service_codes: &[S],
    now: DateTime<Utc>,
) -> Result<DiscountPreview> {
    promo.check_usable(now)?;
    if !promo.service_scope.covers_any(service_codes) {
        return Err(BillingError::PromoScopeMismatch {
            code: promo.code.clone(),
        });
    }
    let subtotal = ensure_amount("subtotal", subtotal)?;

    let discounted = match promo.discount_type {
        DiscountType::Percentage => {
            let keep = (MAX_PERCENTAGE - promo.discount_value) / MAX_PERCENTAGE;
            round_currency(subtotal * keep)
        }
        DiscountType::FlatRate => round_currency(subtotal - promo.discount_value),
    };
    let discounted_amount = discounted.clamp(round_currency(Decimal::ZERO), round_currency(subtotal));

    Ok(DiscountPreview {
        code: promo.code.clone(),
        subtotal,
        discount_amount: round_currency(subtotal - discounted_amount),
        discounted_amount,
        observed_uses: promo.times_used,
        evaluated_at: now,
    })
}
