//! Identifier types for tally.
//!
//! Tenants are identified by UUIDs issued by the tenant directory. Promo
//! redemptions carry a ULID so commits are time-ordered and idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Define a UUID-based identifier newtype with string serde, parsing and display.
macro_rules! uuid_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Create a new identifier from a UUID.
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier (primarily for testing).
            #[must_use]
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Return the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = uuid::Uuid::parse_str(s).map_err(|_| IdError::InvalidUuid)?;
                Ok(Self(uuid))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0.to_string()
            }
        }
    };
}

uuid_id_type!(
    TenantId,
    "A tenant identifier (UUID).\n\nEvery catalog, promo code and settings object belongs to exactly one tenant."
);

/// A promo redemption identifier using ULID for time-ordering.
///
/// The promo store records committed redemption IDs, so replaying the same
/// commit is rejected instead of consuming a second use.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RedemptionId(Ulid);

impl RedemptionId {
    /// Create a new `RedemptionId` from a ULID.
    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Generate a new `RedemptionId` with the current timestamp.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    /// Generate a new `RedemptionId` stamped with `at`.
    #[must_use]
    pub fn at(at: DateTime<Utc>) -> Self {
        Self(Ulid::from_datetime(at.into()))
    }

    /// Return the underlying ULID.
    #[must_use]
    pub const fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Instant encoded in the ULID, to millisecond precision.
    #[must_use]
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from(self.0.datetime())
    }
}

impl FromStr for RedemptionId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ulid = Ulid::from_string(s).map_err(|_| IdError::InvalidUlid)?;
        Ok(Self(ulid))
    }
}

impl fmt::Debug for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RedemptionId({})", self.0)
    }
}

impl fmt::Display for RedemptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RedemptionId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RedemptionId> for String {
    fn from(id: RedemptionId) -> Self {
        id.0.to_string()
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format")]
    InvalidUuid,

    /// The input is not a valid ULID.
    #[error("invalid ULID format")]
    InvalidUlid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_parses_its_display_form() {
        let id = TenantId::generate();
        let parsed = TenantId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn tenant_id_serializes_as_string() {
        let id = TenantId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn tenant_id_rejects_garbage() {
        assert_eq!(TenantId::from_str("not-a-uuid"), Err(IdError::InvalidUuid));
    }

    #[test]
    fn redemption_ids_are_time_ordered() {
        let first = RedemptionId::from_ulid(Ulid::from_parts(1_000, 7));
        let second = RedemptionId::from_ulid(Ulid::from_parts(2_000, 3));
        assert!(first < second);
        assert_eq!(RedemptionId::from_str(&first.to_string()).unwrap(), first);
    }

    #[test]
    fn redemption_id_carries_its_instant() {
        let at = DateTime::parse_from_rfc3339("2026-05-04T10:00:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let id = RedemptionId::at(at);
        assert_eq!(id.issued_at(), at);
        assert_ne!(RedemptionId::at(at), id);
    }

    #[test]
    fn redemption_id_rejects_garbage() {
        assert_eq!(
            RedemptionId::from_str("definitely not a ulid"),
            Err(IdError::InvalidUlid)
        );
    }
}
