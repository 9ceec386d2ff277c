//! In-memory storage implementation.
//!
//! This module provides `MemoryStore`, which implements every storage trait
//! over per-tenant maps guarded by one `parking_lot::RwLock`. Reads clone a
//! snapshot; writes validate against the current state before applying.
//!
//! Committed redemption ids are remembered for a replay window (24 hours by
//! default) around the instant each commit was previewed at. Ids are ULIDs, so
//! the oldest ones are dropped from the front of an ordered set, and an id
//! issued outside the window is refused as stale instead of being trusted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tally_core::{
    BillingError, PromoCode, RedemptionDecision, RedemptionId, ServiceCatalog, ServiceEntry,
    TenantBillingSettings, TenantId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::seed::SeedDocument;
use crate::{CatalogProvider, PromoStore, Redemption, SettingsProvider};

/// State held for one tenant.
#[derive(Debug, Default)]
struct TenantState {
    catalog: ServiceCatalog,
    promos: BTreeMap<String, PromoCode>,
    settings: TenantBillingSettings,
    /// Committed ids within the replay window, oldest first.
    redemptions: BTreeSet<RedemptionId>,
}

/// How long committed redemption ids are remembered by default.
pub const DEFAULT_REPLAY_WINDOW_HOURS: u32 = 24;

/// Thread-safe in-memory storage.
#[derive(Debug)]
pub struct MemoryStore {
    tenants: RwLock<HashMap<TenantId, TenantState>>,
    replay_window: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tenants: RwLock::default(),
            replay_window: Duration::hours(i64::from(DEFAULT_REPLAY_WINDOW_HOURS)),
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember committed redemption ids for `window` instead of the default.
    #[must_use]
    pub fn with_replay_window(mut self, window: Duration) -> Self {
        self.replay_window = window;
        self
    }

    /// Create a store pre-loaded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid promo, duplicate code or invalid settings in
    /// the seed.
    pub fn from_seed(seed: SeedDocument) -> Result<Self> {
        let store = Self::new();
        store.apply_seed(seed)?;
        Ok(store)
    }

    /// Load `seed` into the store, replacing the catalogs and settings of the
    /// tenants it names.
    ///
    /// # Errors
    ///
    /// See [`MemoryStore::from_seed`]. Tenants before the failing one stay loaded.
    pub fn apply_seed(&self, seed: SeedDocument) -> Result<()> {
        for tenant_seed in seed.tenants {
            let tenant = tenant_seed.tenant_id;
            tenant_seed.settings.validate()?;

            let mut promos = BTreeMap::new();
            for promo in tenant_seed.promos {
                let promo = normalize_promo(promo)?;
                if promos.contains_key(&promo.code) {
                    return Err(StoreError::AlreadyExists {
                        entity: "promo",
                        id: promo.code,
                    });
                }
                promos.insert(promo.code.clone(), promo);
            }

            tracing::info!(
                tenant_id = %tenant,
                services = tenant_seed.services.len(),
                promos = promos.len(),
                "Seeded tenant"
            );

            let mut tenants = self.tenants.write();
            let state = tenants.entry(tenant).or_default();
            state.catalog = tenant_seed.services;
            state.promos = promos;
            state.settings = tenant_seed.settings;
        }
        Ok(())
    }

    /// Number of tenants with stored state.
    #[must_use]
    pub fn tenant_count(&self) -> usize {
        self.tenants.read().len()
    }
}

/// Earliest and latest issue instants accepted for a commit evaluated at `at`.
fn replay_bounds(at: DateTime<Utc>, window: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (
        at.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC),
        at.checked_add_signed(window).unwrap_or(DateTime::<Utc>::MAX_UTC),
    )
}

fn normalize_promo(mut promo: PromoCode) -> Result<PromoCode> {
    promo.code = keys::promo_key(&promo.code);
    promo.validate()?;
    Ok(promo)
}

impl CatalogProvider for MemoryStore {
    fn catalog(&self, tenant: &TenantId) -> Result<ServiceCatalog> {
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .map(|state| state.catalog.clone())
            .unwrap_or_default())
    }

    fn upsert_service(&self, tenant: &TenantId, entry: ServiceEntry) -> Result<bool> {
        let code = keys::service_key(&entry.code);
        let created = self
            .tenants
            .write()
            .entry(*tenant)
            .or_default()
            .catalog
            .upsert(entry)?;

        tracing::info!(
            tenant_id = %tenant,
            service_code = %code,
            created,
            "Service entry saved"
        );
        Ok(created)
    }

    fn set_service_active(
        &self,
        tenant: &TenantId,
        code: &str,
        active: bool,
    ) -> Result<ServiceEntry> {
        let code = keys::service_key(code);
        let not_found = || StoreError::NotFound {
            entity: "service",
            id: code.clone(),
        };

        let mut tenants = self.tenants.write();
        let catalog = &mut tenants.get_mut(tenant).ok_or_else(not_found)?.catalog;
        if catalog.get(&code).is_none() {
            return Err(not_found());
        }
        catalog.set_active(&code, active)?;
        let entry = catalog.get(&code).cloned().ok_or_else(not_found)?;
        drop(tenants);

        tracing::info!(
            tenant_id = %tenant,
            service_code = %code,
            active,
            "Service entry toggled"
        );
        Ok(entry)
    }
}

impl PromoStore for MemoryStore {
    fn get_promo(&self, tenant: &TenantId, code: &str) -> Result<Option<PromoCode>> {
        let key = keys::promo_key(code);
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .and_then(|state| state.promos.get(&key))
            .cloned())
    }

    fn create_promo(&self, tenant: &TenantId, promo: PromoCode) -> Result<PromoCode> {
        let promo = normalize_promo(promo)?;

        let mut tenants = self.tenants.write();
        let promos = &mut tenants.entry(*tenant).or_default().promos;
        if promos.contains_key(&promo.code) {
            return Err(StoreError::AlreadyExists {
                entity: "promo",
                id: promo.code,
            });
        }
        promos.insert(promo.code.clone(), promo.clone());
        drop(tenants);

        tracing::info!(
            tenant_id = %tenant,
            promo_code = %promo.code,
            discount_type = ?promo.discount_type,
            "Promo code created"
        );
        Ok(promo)
    }

    fn set_promo_active(&self, tenant: &TenantId, code: &str, active: bool) -> Result<PromoCode> {
        let key = keys::promo_key(code);

        let mut tenants = self.tenants.write();
        let promo = tenants
            .get_mut(tenant)
            .and_then(|state| state.promos.get_mut(&key))
            .ok_or_else(|| StoreError::NotFound {
                entity: "promo",
                id: key.clone(),
            })?;
        promo.active = active;
        let promo = promo.clone();
        drop(tenants);

        tracing::info!(tenant_id = %tenant, promo_code = %key, active, "Promo code toggled");
        Ok(promo)
    }

    fn is_redeemed(&self, tenant: &TenantId, redemption_id: RedemptionId) -> Result<bool> {
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .is_some_and(|state| state.redemptions.contains(&redemption_id)))
    }

    fn commit_redemption(
        &self,
        tenant: &TenantId,
        decision: RedemptionDecision,
    ) -> Result<Redemption> {
        let key = keys::promo_key(decision.code());
        let redemption_id = decision.redemption_id();
        let evaluated_at = decision.evaluated_at();

        let (oldest, newest) = replay_bounds(evaluated_at, self.replay_window);
        let issued_at = redemption_id.issued_at();
        if issued_at < oldest || issued_at > newest {
            return Err(StoreError::StaleRedemption { redemption_id });
        }

        let mut tenants = self.tenants.write();
        let state = tenants.get_mut(tenant).ok_or_else(|| StoreError::NotFound {
            entity: "promo",
            id: key.clone(),
        })?;

        while state
            .redemptions
            .first()
            .is_some_and(|id| id.issued_at() < oldest)
        {
            state.redemptions.pop_first();
        }

        if state.redemptions.contains(&redemption_id) {
            return Err(StoreError::DuplicateRedemption { redemption_id });
        }

        let promo = state
            .promos
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound {
                entity: "promo",
                id: key.clone(),
            })?;

        if promo.times_used != decision.observed_uses() {
            tracing::debug!(
                tenant_id = %tenant,
                promo_code = %key,
                observed = decision.observed_uses(),
                current = promo.times_used,
                "Promo used concurrently since preview"
            );
        }
        if promo.is_expired_at(evaluated_at) {
            return Err(BillingError::PromoExpired { code: key }.into());
        }
        if !promo.active {
            return Err(BillingError::PromoNotActive { code: key }.into());
        }
        promo.record_redemption()?;

        let times_used = promo.times_used;
        let uses_remaining = promo.uses_remaining();
        state.redemptions.insert(redemption_id);
        drop(tenants);

        tracing::info!(
            tenant_id = %tenant,
            promo_code = %key,
            redemption_id = %redemption_id,
            times_used,
            "Promo redemption committed"
        );

        Ok(Redemption {
            redemption_id,
            discount: decision.into_preview(),
            times_used,
            uses_remaining,
        })
    }
}

impl SettingsProvider for MemoryStore {
    fn settings(&self, tenant: &TenantId) -> Result<TenantBillingSettings> {
        Ok(self
            .tenants
            .read()
            .get(tenant)
            .map(|state| state.settings.clone())
            .unwrap_or_default())
    }

    fn put_settings(&self, tenant: &TenantId, settings: TenantBillingSettings) -> Result<()> {
        settings.validate()?;
        self.tenants.write().entry(*tenant).or_default().settings = settings;

        tracing::info!(tenant_id = %tenant, "Billing settings updated");
        Ok(())
    }
}
