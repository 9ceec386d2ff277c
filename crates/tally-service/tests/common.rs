//! Common test utilities for tally integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use rust_decimal_macros::dec;

use tally_core::{
    BillingTrigger, BillingUnit, ClassCode, CoverageConfig, CoverageType, ServiceEntry,
    TenantBillingSettings, TenantId,
};
use tally_service::{create_router, AppState, ServiceConfig};
use tally_store::{CatalogProvider, MemoryStore, SettingsProvider};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The store behind the server, for direct setup and checks.
    pub store: Arc<MemoryStore>,
    /// A seeded tenant.
    pub tenant: TenantId,
}

impl TestHarness {
    /// Create a harness with an empty store.
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            catalog_seed_path: None,
            redemption_window_hours: 24,
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            tenant: TenantId::generate(),
        }
    }

    /// Create a harness whose tenant has a small catalog and coverage enabled.
    ///
    /// - `ASSEMBLY_60`: assembly, flat, 45.00 per task
    /// - `RCV_L`: receiving, class L, 8.00 per item
    /// - `RCV`: receiving, flat, 5.00 per item
    /// - `STORAGE_M`: storage, class M, rate unset
    pub fn seeded() -> Self {
        let harness = Self::new();

        let entries = [
            ServiceEntry::new(
                "ASSEMBLY_60",
                "Assembly (60 min)",
                "assembly",
                BillingUnit::PerTask,
                BillingTrigger::ThroughTask,
            )
            .with_rate(dec!(45.00)),
            ServiceEntry::new(
                "RCV_L",
                "Receiving L",
                "receiving",
                BillingUnit::PerItem,
                BillingTrigger::ScanEvent,
            )
            .with_class(ClassCode::L)
            .with_rate(dec!(8.00)),
            ServiceEntry::new(
                "RCV",
                "Receiving",
                "receiving",
                BillingUnit::PerItem,
                BillingTrigger::ScanEvent,
            )
            .with_rate(dec!(5.00)),
            ServiceEntry::new(
                "STORAGE_M",
                "Storage M",
                "storage",
                BillingUnit::PerDay,
                BillingTrigger::AutoCalculated,
            )
            .with_class(ClassCode::M),
        ];
        for entry in entries {
            harness
                .store
                .upsert_service(&harness.tenant, entry)
                .expect("Failed to seed catalog");
        }

        harness
            .store
            .put_settings(
                &harness.tenant,
                TenantBillingSettings {
                    coverage: CoverageConfig {
                        enabled: true,
                        default_type: CoverageType::FullWithDeductible,
                        rate_no_deductible: dec!(0.0188),
                        rate_with_deductible: dec!(0.0142),
                        deductible_amount: dec!(300.00),
                        applies_to_items: true,
                        applies_to_shipments: true,
                    },
                    default_minimum_charge: None,
                },
            )
            .expect("Failed to seed settings");

        harness
    }

    /// Path under the harness tenant, e.g. `tenant_path("/quotes")`.
    pub fn tenant_path(&self, suffix: &str) -> String {
        format!("/v1/tenants/{}{suffix}", self.tenant)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
