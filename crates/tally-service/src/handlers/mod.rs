//! API handlers.

pub mod health;
pub mod promos;
pub mod quotes;
pub mod services;
pub mod settings;

use tally_core::TenantId;

use crate::error::ApiError;

/// Parse the `:tenant_id` path segment.
pub(crate) fn parse_tenant(tenant_id: &str) -> Result<TenantId, ApiError> {
    tenant_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid tenant ID: {tenant_id}")))
}
