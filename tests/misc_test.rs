//! Miscellaneous integration tests (health check, error pages, settings, cache).

mod common;

use axum::http::StatusCode;
use common::TestClient;
use deedbook::db::queries::properties;
use deedbook::models::{NewProperty, PropertyType};

#[tokio::test]
async fn test_health_endpoint() {
    let client = TestClient::new();
    let (status, body) = client.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_unknown_route_renders_error_page() {
    let client = TestClient::new();
    let (status, body) = client.get("/no-such-page").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("Not Found"));
}

#[tokio::test]
async fn test_api_errors_keep_plain_body() {
    let client = TestClient::new();
    let (status, body) = client.get("/api/reports/summary?property_id=abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body.contains("<!DOCTYPE html>"));
}

#[tokio::test]
async fn test_settings_round_trip() {
    let client = TestClient::new();

    let (status, body) = client.get("/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<option value=\"USD\" selected>"));

    let response = client
        .post_form(
            "/settings/update",
            &[
                ("theme", "dark"),
                ("currency", "GBP"),
                ("page_size", "10"),
                ("locale", "en-GB"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/settings?saved=1"));

    let (_, body) = client.get("/settings?saved=1").await;
    assert!(body.contains("Settings saved successfully"));
    assert!(body.contains("<option value=\"GBP\" selected>"));
    assert!(body.contains("class=\"dark\""));
    assert!(body.contains("value=\"10\""));
}

#[tokio::test]
async fn test_settings_reject_bad_page_size() {
    let client = TestClient::new();
    let response = client
        .post_form(
            "/settings/update",
            &[
                ("theme", "system"),
                ("currency", "USD"),
                ("page_size", "0"),
                ("locale", "en-US"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(client.state.load_settings().unwrap().page_size, 25);

    let response = client
        .post_form(
            "/settings/update",
            &[
                ("theme", "system"),
                ("currency", "USD"),
                ("page_size", "9223372036854775807"),
                ("locale", "en-US"),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Page size must be a number between 1 and 500"));
    assert_eq!(client.state.load_settings().unwrap().page_size, 25);
}

#[tokio::test]
async fn test_pages_render_when_empty() {
    let client = TestClient::new();
    for uri in [
        "/",
        "/properties",
        "/properties/new",
        "/cash-flows",
        "/cash-flows/new",
        "/tenants",
        "/tenants/new",
        "/maintenance",
        "/maintenance/new",
        "/valuations",
        "/valuations/new",
        "/settings",
    ] {
        let (status, _) = client.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {}", uri);
    }
}

#[tokio::test]
async fn test_property_options_refresh_after_mutation() {
    let client = TestClient::new();

    // Warm the cache.
    assert!(client.state.cached_property_options().unwrap().is_empty());

    // A direct write bypasses the invalidation middleware.
    {
        let conn = client.state.db.get().unwrap();
        properties::create_property(
            &conn,
            &NewProperty {
                name: "Quiet Cottage".into(),
                address: "3 Lane".into(),
                property_type: PropertyType::Residential,
                purchase_price_cents: 0,
                purchase_date: None,
                notes: None,
            },
        )
        .unwrap();
    }
    assert!(client.state.cached_property_options().unwrap().is_empty());

    // Any successful mutation through the router bumps the generation.
    client.create_property("Birch House", "1000").await;
    let names: Vec<String> = client
        .state
        .cached_property_options()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"Quiet Cottage".to_string()));
}

#[tokio::test]
async fn test_tenant_maintenance_and_valuation_pages() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "200000").await;
    let pid = id.to_string();

    let response = client
        .post_form(
            "/tenants/create",
            &[
                ("property_id", pid.as_str()),
                ("name", "Dana Okafor"),
                ("lease_start", "2024-02-01"),
                ("lease_end", "2024-01-01"),
                ("monthly_rent", "1450"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body.contains("Lease end must not be before lease start"));

    let response = client
        .post_form(
            "/maintenance/create",
            &[
                ("property_id", pid.as_str()),
                ("title", "Roof inspection"),
                ("frequency", "Annually"),
                ("next_due_date", "2000-01-01"),
                ("estimated_cost", "350"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let (_, body) = client.get(&format!("/maintenance?property_id={}", id)).await;
    assert!(body.contains("Roof inspection"));
    assert!(body.contains("1 overdue"));
    assert!(body.contains("$350.00"));

    let (_, body) = client.get("/").await;
    assert!(body.contains("Roof inspection"));

    let response = client
        .post_form(
            "/valuations/create",
            &[
                ("property_id", pid.as_str()),
                ("valuation_date", "2024-06-30"),
                ("value", "180000"),
                ("source", "Agent"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let (_, body) = client.get("/valuations").await;
    assert!(body.contains("$180,000"));
    assert!(body.contains("-$20,000.00"));
    assert!(body.contains("-10.00%"));
}
