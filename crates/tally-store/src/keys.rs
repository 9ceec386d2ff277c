//! Key normalization for the in-memory maps.
//!
//! Service and promo codes are case-insensitive, so every lookup goes
//! through these helpers before touching a map.

use tally_core::normalize_code;

/// Map key for a promo code.
#[must_use]
pub fn promo_key(code: &str) -> String {
    normalize_code(code)
}

/// Map key for a service code.
#[must_use]
pub fn service_key(code: &str) -> String {
    normalize_code(code)
}
