//! Service catalog types.
//!
//! A tenant's catalog lists every billable service. Entries are either
//! class-scoped (priced per item-size class) or flat (`class_code: None`).
//! Catalog-level invariants are enforced when entries are added or edited,
//! so the resolver never has to guess between two rows for the same scope.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::money::ensure_optional_amount;

/// Item-size classification used for class-based pricing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassCode {
    /// Extra small.
    XS,
    /// Small.
    S,
    /// Medium.
    M,
    /// Large.
    L,
    /// Extra large.
    XL,
    /// Extra extra large.
    XXL,
}

impl ClassCode {
    /// All classes, smallest first.
    pub const ALL: [Self; 6] = [Self::XS, Self::S, Self::M, Self::L, Self::XL, Self::XXL];

    /// Get the class code as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XS => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::L => "L",
            Self::XL => "XL",
            Self::XXL => "XXL",
        }
    }
}

impl fmt::Display for ClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassCode {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BillingError::InvalidServiceEntry(format!("unknown class code: {s}")))
    }
}

/// Unit a service rate is quoted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingUnit {
    /// Charged for each day an item is held (storage).
    PerDay,
    /// Charged once per item handled.
    PerItem,
    /// Charged once per task performed.
    PerTask,
}

/// When a charge is evaluated.
///
/// The trigger only tells the operational side when to ask for a charge; it
/// has no effect on rate math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingTrigger {
    /// Fires when an item is scanned.
    ScanEvent,
    /// Computed periodically (e.g. storage days).
    AutoCalculated,
    /// Fires when a task completes.
    ThroughTask,
    /// Fires once per shipment.
    PerShipment,
    /// Fires during a stocktake.
    Stocktake,
    /// Raised for manual review before billing.
    FlaggedForReview,
}

/// One billable offering in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Unique code within the tenant (e.g. `ASSEMBLY_60`).
    pub code: String,

    /// Display label.
    pub name: String,

    /// Semantic category the service prices (e.g. `receiving`).
    pub category: String,

    /// Size class this entry prices; `None` for a flat service.
    #[serde(default)]
    pub class_code: Option<ClassCode>,

    /// Rate per billing unit; `None` while pending configuration.
    #[serde(default)]
    pub rate: Option<Decimal>,

    /// Unit the rate is quoted in.
    pub billing_unit: BillingUnit,

    /// When the charge fires.
    pub billing_trigger: BillingTrigger,

    /// Whether the charge is taxable.
    #[serde(default)]
    pub taxable: bool,

    /// Inactive entries never resolve.
    #[serde(default = "default_active")]
    pub active: bool,
}

const fn default_active() -> bool {
    true
}

impl ServiceEntry {
    /// Create an active, flat, non-taxable entry with no rate set.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        billing_unit: BillingUnit,
        billing_trigger: BillingTrigger,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            category: category.into(),
            class_code: None,
            rate: None,
            billing_unit,
            billing_trigger,
            taxable: false,
            active: true,
        }
        .normalized()
    }

    /// Scope the entry to a size class.
    #[must_use]
    pub fn with_class(mut self, class_code: ClassCode) -> Self {
        self.class_code = Some(class_code);
        self
    }

    /// Set the rate.
    #[must_use]
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Mark the entry taxable.
    #[must_use]
    pub fn taxable(mut self) -> Self {
        self.taxable = true;
        self
    }

    /// Mark the entry inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Whether this entry prices `category` (case-insensitive).
    #[must_use]
    pub fn matches_category(&self, category: &str) -> bool {
        self.category.trim().eq_ignore_ascii_case(category.trim())
    }

    /// Whether this entry carries `code` (case-insensitive).
    #[must_use]
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// Whether this entry and `other` price the same category and class.
    #[must_use]
    pub fn same_scope(&self, other: &Self) -> bool {
        self.class_code == other.class_code && self.matches_category(&other.category)
    }

    /// Canonical form: trimmed, upper-case code and lower-case category.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.code = normalize_code(&self.code);
        self.category = self.category.trim().to_ascii_lowercase();
        self.name = self.name.trim().to_string();
        self
    }

    /// Check the entry's own fields.
    ///
    /// # Errors
    ///
    /// - `BillingError::InvalidServiceEntry` if the code, name or category is blank.
    /// - `BillingError::InvalidAmount` if the rate is negative or too precise.
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(BillingError::InvalidServiceEntry("code is required".into()));
        }
        if self.name.trim().is_empty() {
            return Err(BillingError::InvalidServiceEntry(format!(
                "{}: name is required",
                self.code
            )));
        }
        if self.category.trim().is_empty() {
            return Err(BillingError::InvalidServiceEntry(format!(
                "{}: category is required",
                self.code
            )));
        }
        ensure_optional_amount("rate", self.rate)?;
        Ok(())
    }
}

/// Canonical form of a service or promo code.
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// A tenant's ordered service catalog.
///
/// Iteration order is insertion order, and it is the order the resolver
/// walks when more than one entry qualifies at the same tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ServiceEntry>", into = "Vec<ServiceEntry>")]
pub struct ServiceCatalog {
    entries: Vec<ServiceEntry>,
}

impl ServiceCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog, validating every entry in order.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation, see [`ServiceCatalog::insert`].
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceEntry>) -> Result<Self> {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Add a new entry.
    ///
    /// # Errors
    ///
    /// - `BillingError::DuplicateServiceCode` if the code is taken.
    /// - `BillingError::DuplicateServiceScope` if the entry is active and
    ///   another active entry prices the same category and class.
    /// - Validation errors from [`ServiceEntry::validate`].
    pub fn insert(&mut self, entry: ServiceEntry) -> Result<()> {
        let entry = entry.normalized();
        entry.validate()?;

        if self.get(&entry.code).is_some() {
            return Err(BillingError::DuplicateServiceCode { code: entry.code });
        }
        if entry.active {
            self.ensure_scope_free(&entry)?;
        }

        self.entries.push(entry);
        Ok(())
    }

    /// Replace the entry with the same code, keeping its catalog position.
    ///
    /// # Errors
    ///
    /// - `BillingError::ServiceNotFound` if no entry has this code.
    /// - `BillingError::DuplicateServiceScope` on an active scope clash.
    /// - Validation errors from [`ServiceEntry::validate`].
    pub fn update(&mut self, entry: ServiceEntry) -> Result<()> {
        let entry = entry.normalized();
        entry.validate()?;

        let index = self.position(&entry.code)?;
        if entry.active {
            self.ensure_scope_free(&entry)?;
        }

        self.entries[index] = entry;
        Ok(())
    }

    /// Insert a new entry or update the existing one with the same code.
    ///
    /// Returns `true` when the entry was newly created.
    ///
    /// # Errors
    ///
    /// See [`ServiceCatalog::insert`] and [`ServiceCatalog::update`].
    pub fn upsert(&mut self, entry: ServiceEntry) -> Result<bool> {
        if self.get(&entry.code).is_some() {
            self.update(entry)?;
            Ok(false)
        } else {
            self.insert(entry)?;
            Ok(true)
        }
    }

    /// Activate or deactivate an entry.
    ///
    /// # Errors
    ///
    /// - `BillingError::ServiceNotFound` if no entry has this code.
    /// - `BillingError::DuplicateServiceScope` when activating would clash.
    pub fn set_active(&mut self, code: &str, active: bool) -> Result<()> {
        let index = self.position(code)?;
        if active && !self.entries[index].active {
            let mut candidate = self.entries[index].clone();
            candidate.active = true;
            self.ensure_scope_free(&candidate)?;
        }
        self.entries[index].active = active;
        Ok(())
    }

    /// Look up an entry by code (case-insensitive).
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ServiceEntry> {
        self.entries.iter().find(|e| e.matches_code(code))
    }

    /// All entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[ServiceEntry] {
        &self.entries
    }

    /// Active entries in catalog order.
    pub fn active_entries(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter().filter(|e| e.active)
    }

    /// Number of entries, active or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, code: &str) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.matches_code(code))
            .ok_or_else(|| BillingError::ServiceNotFound {
                code: normalize_code(code),
            })
    }

    fn ensure_scope_free(&self, entry: &ServiceEntry) -> Result<()> {
        let clash = self
            .active_entries()
            .find(|other| !other.matches_code(&entry.code) && other.same_scope(entry));

        match clash {
            Some(existing) => Err(BillingError::DuplicateServiceScope {
                category: entry.category.clone(),
                class_code: entry.class_code,
                existing: existing.code.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl TryFrom<Vec<ServiceEntry>> for ServiceCatalog {
    type Error = BillingError;

    fn try_from(entries: Vec<ServiceEntry>) -> Result<Self> {
        Self::from_entries(entries)
    }
}

impl From<ServiceCatalog> for Vec<ServiceEntry> {
    fn from(catalog: ServiceCatalog) -> Self {
        catalog.entries
    }
}

impl AsRef<[ServiceEntry]> for ServiceCatalog {
    fn as_ref(&self) -> &[ServiceEntry] {
        &self.entries
    }
}
