//! Tally HTTP API Service.
//!
//! This crate exposes the billing core over HTTP:
//!
//! - Service catalog administration
//! - Per-tenant billing settings
//! - Charge quotes (resolve, compute, discount, cover)
//! - Promo code creation, preview and redemption
//!
//! Every route except `/health` is scoped to a tenant:
//! `/v1/tenants/:tenant_id/...`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers call the synchronous store

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
