//! Storage layer for tally.
//!
//! The billing core never owns state. This crate defines the collaborators
//! that hand it snapshots and apply administrator edits:
//!
//! - [`CatalogProvider`]: per-tenant service catalogs
//! - [`PromoStore`]: promo codes and atomic redemption commits
//! - [`SettingsProvider`]: per-tenant billing settings
//!
//! [`MemoryStore`] implements all three behind a single lock and can be
//! seeded from a JSON file at start-up.
//!
//! # Example
//!
//! ```
//! use tally_core::{BillingTrigger, BillingUnit, ServiceEntry, TenantId};
//! use tally_store::{CatalogProvider, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let tenant = TenantId::generate();
//!
//! let entry = ServiceEntry::new(
//!     "ASSEMBLY_60",
//!     "Assembly (60 min)",
//!     "assembly",
//!     BillingUnit::PerTask,
//!     BillingTrigger::ThroughTask,
//! );
//! store.upsert_service(&tenant, entry).unwrap();
//!
//! let catalog = store.catalog(&tenant).unwrap();
//! assert_eq!(catalog.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod memory;
pub mod seed;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, DEFAULT_REPLAY_WINDOW_HOURS};
pub use seed::{load_seed_file, SeedDocument, TenantSeed};

use serde::Serialize;
use tally_core::{
    DiscountPreview, PromoCode, RedemptionDecision, RedemptionId, ServiceCatalog, ServiceEntry,
    TenantBillingSettings, TenantId,
};

/// Source of per-tenant service catalogs.
pub trait CatalogProvider: Send + Sync {
    /// Snapshot of a tenant's catalog (empty for an unknown tenant).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn catalog(&self, tenant: &TenantId) -> Result<ServiceCatalog>;

    /// Create or replace a service entry.
    ///
    /// Returns `true` when the entry was newly created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Billing` when the entry is invalid or clashes with
    /// another entry's code or scope.
    fn upsert_service(&self, tenant: &TenantId, entry: ServiceEntry) -> Result<bool>;

    /// Activate or deactivate a service entry, returning the updated entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the tenant has no entry with this code.
    /// - `StoreError::Billing` when activating would clash with another entry.
    fn set_service_active(
        &self,
        tenant: &TenantId,
        code: &str,
        active: bool,
    ) -> Result<ServiceEntry>;
}

/// Promo code storage.
pub trait PromoStore: Send + Sync {
    /// Look up a promo code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn get_promo(&self, tenant: &TenantId, code: &str) -> Result<Option<PromoCode>>;

    /// Store a new promo code.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyExists` if the code is taken.
    /// - `StoreError::Billing` if the promo fails validation.
    fn create_promo(&self, tenant: &TenantId, promo: PromoCode) -> Result<PromoCode>;

    /// Switch a promo code on or off, returning the updated code.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the code does not exist.
    fn set_promo_active(&self, tenant: &TenantId, code: &str, active: bool) -> Result<PromoCode>;

    /// Whether `redemption_id` has already been committed for `tenant`.
    ///
    /// Lets callers answer a replayed request before previewing again. The
    /// answer may be stale by the time of the commit, which checks again.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn is_redeemed(&self, tenant: &TenantId, redemption_id: RedemptionId) -> Result<bool>;

    /// Consume one use of the promo code named by `decision`.
    ///
    /// The check and the increment happen atomically. Taking the decision by
    /// value means one preview is committed at most once; the redemption id
    /// guards against replays from other callers. Expiry is re-checked at the
    /// instant the preview was evaluated at.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateRedemption` if the redemption id was already committed.
    /// - `StoreError::StaleRedemption` if the redemption id was issued outside
    ///   the window in which replays are remembered.
    /// - `StoreError::NotFound` if the code no longer exists.
    /// - `StoreError::Billing` with `PromoExpired`, `PromoExhausted` or
    ///   `PromoNotActive` when the code became unusable after the preview.
    fn commit_redemption(
        &self,
        tenant: &TenantId,
        decision: RedemptionDecision,
    ) -> Result<Redemption>;
}

/// Source of per-tenant billing settings.
pub trait SettingsProvider: Send + Sync {
    /// Settings for a tenant (defaults for an unknown tenant).
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store fails.
    fn settings(&self, tenant: &TenantId) -> Result<TenantBillingSettings>;

    /// Replace a tenant's settings.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Billing` if the settings fail validation.
    fn put_settings(&self, tenant: &TenantId, settings: TenantBillingSettings) -> Result<()>;
}

/// A committed promo redemption.
#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct Redemption {
    /// Idempotency key of the commit.
    pub redemption_id: RedemptionId,

    /// The discount that was redeemed.
    pub discount: DiscountPreview,

    /// `times_used` after the commit.
    pub times_used: u32,

    /// Uses left after the commit; `None` when unlimited.
    pub uses_remaining: Option<u32>,
}
