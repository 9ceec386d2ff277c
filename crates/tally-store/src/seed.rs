//! Seed data loaded at start-up.
//!
//! A seed file is a JSON document listing tenants with their catalogs, promo
//! codes and settings:
//!
//! ```json
//! {
//!   "tenants": [
//!     {
//!       "tenant_id": "6f1c2a4e-0d7b-4f7e-9a53-2b8d1c0e9f10",
//!       "services": [
//!         {
//!           "code": "ASSEMBLY_60",
//!           "name": "Assembly (60 min)",
//!           "category": "assembly",
//!           "rate": "45.00",
//!           "billing_unit": "per_task",
//!           "billing_trigger": "through_task"
//!         }
//!       ],
//!       "promos": [],
//!       "settings": { "default_minimum_charge": "5.00" }
//!     }
//!   ]
//! }
//! ```
//!
//! The catalog is validated while it is parsed, so a seed with duplicate
//! codes or clashing scopes fails to load.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tally_core::{PromoCode, ServiceCatalog, TenantBillingSettings, TenantId};

use crate::error::{Result, StoreError};

/// A full seed document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDocument {
    /// Tenants to load.
    #[serde(default)]
    pub tenants: Vec<TenantSeed>,
}

/// Seed data for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSeed {
    /// The tenant.
    pub tenant_id: TenantId,

    /// Service catalog, in resolution order.
    #[serde(default)]
    pub services: ServiceCatalog,

    /// Promo codes.
    #[serde(default)]
    pub promos: Vec<PromoCode>,

    /// Billing settings.
    #[serde(default)]
    pub settings: TenantBillingSettings,
}

/// Load a seed document from a JSON file.
///
/// # Errors
///
/// - `StoreError::NotFound` if the file does not exist.
/// - `StoreError::Io` if it cannot be read.
/// - `StoreError::Serialization` if it is not a valid seed document.
pub fn load_seed_file(path: impl AsRef<Path>) -> Result<SeedDocument> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(StoreError::NotFound {
            entity: "seed file",
            id: path.display().to_string(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    let seed: SeedDocument = serde_json::from_str(&contents)?;

    tracing::debug!(
        path = %path.display(),
        tenants = seed.tenants.len(),
        "Loaded seed file"
    );
    Ok(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CatalogProvider, MemoryStore, PromoStore, SettingsProvider};
    use rust_decimal_macros::dec;
    use std::io::Write;

    const TENANT: &str = "6f1c2a4e-0d7b-4f7e-9a53-2b8d1c0e9f10";

    fn write_seed(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn seed_json() -> String {
        format!(
            r#"{{
              "tenants": [{{
                "tenant_id": "{TENANT}",
                "services": [
                  {{
                    "code": "assembly_60",
                    "name": "Assembly (60 min)",
                    "category": "Assembly",
                    "rate": "45.00",
                    "billing_unit": "per_task",
                    "billing_trigger": "through_task"
                  }},
                  {{
                    "code": "RCV_M",
                    "name": "Receiving M",
                    "category": "receiving",
                    "class_code": "M",
                    "rate": "6.00",
                    "billing_unit": "per_item",
                    "billing_trigger": "scan_event",
                    "taxable": true
                  }}
                ],
                "promos": [{{
                  "code": "summer25",
                  "discount_type": "percentage",
                  "discount_value": "25",
                  "expiration": {{ "type": "none" }},
                  "service_scope": {{ "type": "all" }},
                  "usage_limit": {{ "type": "limited", "limit": 10 }},
                  "active": true,
                  "created_at": "2026-01-01T00:00:00Z"
                }}],
                "settings": {{ "default_minimum_charge": "5.00" }}
              }}]
            }}"#
        )
    }

    #[test]
    fn loads_and_applies_seed() {
        let file = write_seed(&seed_json());
        let seed = load_seed_file(file.path()).unwrap();
        let store = MemoryStore::from_seed(seed).unwrap();
        let tenant: TenantId = TENANT.parse().unwrap();

        let catalog = store.catalog(&tenant).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].code, "ASSEMBLY_60");
        assert_eq!(catalog.entries()[0].category, "assembly");

        let promo = store.get_promo(&tenant, "SUMMER25").unwrap().unwrap();
        assert_eq!(promo.uses_remaining(), Some(10));

        let settings = store.settings(&tenant).unwrap();
        assert_eq!(settings.default_minimum_charge, Some(dec!(5.00)));
        assert!(!settings.coverage.enabled);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_seed_file(dir.path().join("seed.json")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn clashing_catalog_fails_to_parse() {
        let json = seed_json().replace("\"code\": \"RCV_M\"", "\"code\": \"ASSEMBLY_60\"");
        let file = write_seed(&json);
        let err = load_seed_file(file.path()).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn duplicate_promo_codes_are_rejected() {
        let tenant: TenantId = TENANT.parse().unwrap();
        let promo = PromoCode::new(
            "DUP",
            tally_core::DiscountType::FlatRate,
            dec!(1.00),
            chrono::Utc::now(),
        )
        .unwrap();
        let seed = SeedDocument {
            tenants: vec![TenantSeed {
                tenant_id: tenant,
                services: ServiceCatalog::new(),
                promos: vec![promo.clone(), promo],
                settings: TenantBillingSettings::default(),
            }],
        };

        let err = MemoryStore::from_seed(seed).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }
}
