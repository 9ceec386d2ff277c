//! Service catalog and settings integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

fn receiving_m() -> serde_json::Value {
    json!({
        "code": "rcv_m",
        "name": "Receiving M",
        "category": "Receiving",
        "class_code": "M",
        "rate": "6.00",
        "billing_unit": "per_item",
        "billing_trigger": "scan_event"
    })
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
async fn unknown_tenant_has_empty_catalog() {
    let harness = TestHarness::new();

    let response = harness.server.get(&harness.tenant_path("/services")).await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["services"], json!([]));
    assert_eq!(body["active"], 0);
}

#[tokio::test]
async fn create_then_update_service() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post(&harness.tenant_path("/services"))
        .json(&receiving_m())
        .await;
    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["created"], true);
    assert_eq!(body["service"]["code"], "RCV_M");
    assert_eq!(body["service"]["category"], "receiving");

    let mut repriced = receiving_m();
    repriced["rate"] = json!("6.50");
    let response = harness
        .server
        .post(&harness.tenant_path("/services"))
        .json(&repriced)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["created"], false);

    let response = harness.server.get(&harness.tenant_path("/services")).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["services"].as_array().unwrap().len(), 1);
    assert_eq!(body["services"][0]["rate"], "6.50");
}

#[tokio::test]
async fn scope_clash_is_conflict() {
    let harness = TestHarness::new();
    harness
        .server
        .post(&harness.tenant_path("/services"))
        .json(&receiving_m())
        .await
        .assert_status(StatusCode::CREATED);

    let mut clash = receiving_m();
    clash["code"] = json!("RCV_M_2");
    let response = harness
        .server
        .post(&harness.tenant_path("/services"))
        .json(&clash)
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "duplicate_service_scope");
}

#[tokio::test]
async fn overly_precise_rate_is_bad_request() {
    let harness = TestHarness::new();
    let mut entry = receiving_m();
    entry["rate"] = json!("6.005");

    let response = harness
        .server
        .post(&harness.tenant_path("/services"))
        .json(&entry)
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "invalid_amount");
}

#[tokio::test]
async fn deactivated_service_stops_resolving() {
    let harness = TestHarness::seeded();

    let response = harness
        .server
        .post(&harness.tenant_path("/services/assembly_60/active"))
        .json(&json!({ "active": false }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["active"], false);

    let response = harness
        .server
        .post(&harness.tenant_path("/quotes"))
        .json(&json!({ "context": { "category": "assembly" }, "quantity": "1" }))
        .await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn toggling_unknown_service_is_not_found() {
    let harness = TestHarness::seeded();

    let response = harness
        .server
        .post(&harness.tenant_path("/services/NOPE/active"))
        .json(&json!({ "active": true }))
        .await;

    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn settings_default_then_replace() {
    let harness = TestHarness::new();

    let response = harness.server.get(&harness.tenant_path("/settings")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["coverage"]["enabled"], false);
    assert!(body["default_minimum_charge"].is_null());

    harness
        .server
        .put(&harness.tenant_path("/settings"))
        .json(&json!({ "default_minimum_charge": "25.00" }))
        .await
        .assert_status_ok();

    let response = harness.server.get(&harness.tenant_path("/settings")).await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["default_minimum_charge"], "25.00");
}

#[tokio::test]
async fn tenant_minimum_applies_to_quotes() {
    let harness = TestHarness::seeded();
    harness
        .server
        .put(&harness.tenant_path("/settings"))
        .json(&json!({ "default_minimum_charge": "25.00" }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post(&harness.tenant_path("/quotes"))
        .json(&json!({
            "context": { "category": "receiving", "class_code": "L" },
            "quantity": "1"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["charge"]["raw_amount"], "8.00");
    assert_eq!(body["charge"]["minimum_applied"], true);
    assert_eq!(body["total"], "25.00");
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .put(&harness.tenant_path("/settings"))
        .json(&json!({ "default_minimum_charge": "-5.00" }))
        .await;

    response.assert_status_bad_request();
}
