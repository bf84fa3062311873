//! Shared test utilities for integration tests.
//!
//! `TestClient` drives the full router (error pages and cache invalidation
//! included) against a fresh in-memory database.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use deedbook::config::Config;
use deedbook::db::create_in_memory_pool;
use deedbook::server;
use deedbook::state::AppState;
use http_body_util::BodyExt;
use std::path::PathBuf;
use tower::ServiceExt;

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// A test client that sends sequential requests against one application.
pub struct TestClient {
    pub state: AppState,
}

impl TestClient {
    /// Create a new test client with a fresh in-memory database.
    pub fn new() -> Self {
        let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_path: PathBuf::from(":memory:"),
            migrations_path: manifest_dir.join("migrations"),
            static_path: manifest_dir.join("static"),
        };

        let pool = create_in_memory_pool().expect("Failed to create in-memory pool");
        let (state, _app) =
            server::build_app_with_pool(pool, config).expect("Failed to build app");

        Self { state }
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router().oneshot(request).await.unwrap();

        let status = response.status();
        let header_value = |name| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        let location = header_value(header::LOCATION);
        let content_type = header_value(header::CONTENT_TYPE);
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            location,
            content_type,
            body: String::from_utf8_lossy(&body).to_string(),
        }
    }

    /// Make a GET request and return status and body.
    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        let response = self.get_full(uri).await;
        (response.status, response.body)
    }

    pub async fn get_full(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with form data.
    pub async fn post_form(&self, uri: &str, form_data: &[(&str, &str)]) -> TestResponse {
        let body = form_data
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> StatusCode {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .status
    }

    /// Get JSON from an endpoint and parse it.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.get(uri).await;
        let parsed = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, parsed)
    }

    // =========================================================================
    // Helper methods for creating entities through the web forms
    // =========================================================================

    /// Create a property and return its id, taken from the redirect.
    pub async fn create_property(&self, name: &str, purchase_price: &str) -> i64 {
        let response = self
            .post_form(
                "/properties/create",
                &[
                    ("name", name),
                    ("address", "1 Test Street"),
                    ("property_type", "Residential"),
                    ("purchase_price", purchase_price),
                    ("purchase_date", "2020-06-01"),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::SEE_OTHER, "{}", response.body);

        response
            .location
            .as_deref()
            .and_then(|l| l.strip_prefix("/properties/"))
            .and_then(|id| id.parse().ok())
            .expect("redirect to the new property")
    }

    /// Record a cash flow. An empty `direction` lets the category decide.
    pub async fn create_cash_flow(
        &self,
        property_id: i64,
        date: &str,
        category: &str,
        direction: &str,
        amount: &str,
        description: &str,
    ) -> StatusCode {
        let property_id = property_id.to_string();
        self.post_form(
            "/cash-flows/create",
            &[
                ("property_id", property_id.as_str()),
                ("date", date),
                ("category", category),
                ("direction", direction),
                ("amount", amount),
                ("description", description),
            ],
        )
        .await
        .status
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.state.db.get().unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
    }
}
