//! Service resolution.
//!
//! Given a charge context, find the one catalog entry that prices it. The
//! search runs a fixed fallback order and stops at the first tier with a
//! match; within a tier the first entry in catalog order wins.

use serde::{Deserialize, Serialize};

use crate::catalog::{normalize_code, ClassCode, ServiceEntry};
use crate::error::{BillingError, Result};

/// What is being charged for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeContext {
    /// Semantic category of the operational event (e.g. `receiving`).
    pub category: String,

    /// Size class of the item, when known.
    #[serde(default)]
    pub class_code: Option<ClassCode>,

    /// Explicit service code chosen by the operator; bypasses category matching.
    #[serde(default)]
    pub service_code: Option<String>,
}

impl ChargeContext {
    /// Create a context for a category with no class or explicit service.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into().trim().to_ascii_lowercase(),
            class_code: None,
            service_code: None,
        }
    }

    /// Set the item class.
    #[must_use]
    pub fn with_class(mut self, class_code: ClassCode) -> Self {
        self.class_code = Some(class_code);
        self
    }

    /// Set an explicit service code.
    #[must_use]
    pub fn with_service_code(mut self, code: impl AsRef<str>) -> Self {
        self.service_code = Some(normalize_code(code.as_ref()));
        self
    }
}

/// Which fallback tier produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionTier {
    /// The context named the service code explicitly.
    ExplicitCode,
    /// Category and requested class both matched.
    ClassSpecific,
    /// Category matched a flat (class-agnostic) entry.
    ClassAgnostic,
    /// Category matched an entry priced for some other class.
    AnyClass,
}

/// A successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// The entry that prices the charge.
    pub entry: &'a ServiceEntry,
    /// The tier that matched.
    pub tier: ResolutionTier,
}

/// Resolve the catalog entry that prices `context`.
///
/// Only active entries are considered. The order is:
///
/// 1. the explicit service code, when given (no fallthrough if it misses);
/// 2. same category and the requested class;
/// 3. same category and no class (flat service);
/// 4. same category, any class.
///
/// # Errors
///
/// Returns `BillingError::NoMatchingService` when no tier matches. A missing
/// price is reported, never priced at zero.
pub fn resolve<'a>(
    context: &ChargeContext,
    entries: impl IntoIterator<Item = &'a ServiceEntry>,
) -> Result<Resolution<'a>> {
    let active: Vec<&ServiceEntry> = entries.into_iter().filter(|e| e.active).collect();

    if let Some(code) = context.service_code.as_deref() {
        return active
            .into_iter()
            .find(|e| e.matches_code(code))
            .map(|entry| Resolution {
                entry,
                tier: ResolutionTier::ExplicitCode,
            })
            .ok_or_else(|| BillingError::NoMatchingService {
                category: normalize_code(code),
                class_code: context.class_code,
            });
    }

    let in_category: Vec<&ServiceEntry> = active
        .into_iter()
        .filter(|e| e.matches_category(&context.category))
        .collect();

    let class_specific = context.class_code.and_then(|class| {
        in_category
            .iter()
            .copied()
            .find(|e| e.class_code == Some(class))
            .map(|entry| (entry, ResolutionTier::ClassSpecific))
    });

    class_specific
        .or_else(|| {
            in_category
                .iter()
                .copied()
                .find(|e| e.class_code.is_none())
                .map(|entry| (entry, ResolutionTier::ClassAgnostic))
        })
        .or_else(|| {
            in_category
                .first()
                .copied()
                .map(|entry| (entry, ResolutionTier::AnyClass))
        })
        .map(|(entry, tier)| Resolution { entry, tier })
        .ok_or_else(|| BillingError::NoMatchingService {
            category: context.category.clone(),
            class_code: context.class_code,
        })
}
