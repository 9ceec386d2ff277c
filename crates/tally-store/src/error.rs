//! Error types for tally storage.

use tally_core::{BillingError, RedemptionId};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`promo`, `service`).
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// A record with the same key already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// The conflicting key.
        id: String,
    },

    /// Redemption already committed (idempotency check failed).
    #[error("duplicate redemption: {redemption_id}")]
    DuplicateRedemption {
        /// The redemption ID that was replayed.
        redemption_id: RedemptionId,
    },

    /// Redemption id issued too far from the commit to be checked for replays.
    #[error("stale redemption id: {redemption_id}")]
    StaleRedemption {
        /// The rejected redemption ID.
        redemption_id: RedemptionId,
    },

    /// A billing invariant rejected the change.
    #[error(transparent)]
    Billing(#[from] BillingError),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Reading seed data failed.
    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
