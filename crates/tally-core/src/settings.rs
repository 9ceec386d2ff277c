//! Per-tenant billing settings.
//!
//! Settings are immutable values handed to each computation. Editing them
//! means replacing the whole value through the settings provider.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::coverage::CoverageConfig;
use crate::error::Result;
use crate::money::ensure_optional_amount;

/// Billing preferences for one tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBillingSettings {
    /// Valuation coverage rate table.
    #[serde(default)]
    pub coverage: CoverageConfig,

    /// Minimum charge used when a quote does not supply one.
    #[serde(default)]
    pub default_minimum_charge: Option<Decimal>,
}

impl TenantBillingSettings {
    /// Check the settings.
    ///
    /// # Errors
    ///
    /// Returns `BillingError::InvalidAmount` for an invalid minimum charge or
    /// coverage rate table.
    pub fn validate(&self) -> Result<()> {
        ensure_optional_amount("default_minimum_charge", self.default_minimum_charge)?;
        self.coverage.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_disable_coverage() {
        let settings = TenantBillingSettings::default();
        assert!(!settings.coverage.enabled);
        assert!(settings.default_minimum_charge.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn minimum_charge_must_be_currency() {
        let settings = TenantBillingSettings {
            default_minimum_charge: Some(dec!(9.999)),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn empty_json_uses_defaults() {
        let settings: TenantBillingSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, TenantBillingSettings::default());
    }
}
