//! Integration tests for recording and listing cash flows.

mod common;

use axum::http::StatusCode;
use common::TestClient;

#[tokio::test]
async fn test_blank_direction_follows_category() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;

    assert_eq!(
        client.create_cash_flow(id, "2024-01-05", "rent", "", "1500", "Rent").await,
        StatusCode::SEE_OTHER
    );
    assert_eq!(
        client.create_cash_flow(id, "2024-01-10", "Window cleaning", "", "80", "").await,
        StatusCode::SEE_OTHER
    );

    let conn = client.state.db.get().unwrap();
    let rows: Vec<(String, String)> = conn
        .prepare("SELECT category, direction FROM cash_flows ORDER BY date")
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        rows,
        vec![
            ("RENT".to_string(), "CREDIT".to_string()),
            ("Window cleaning".to_string(), "DEBIT".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_explicit_direction_wins() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;

    assert_eq!(
        client
            .create_cash_flow(id, "2024-02-01", "DEPOSIT", "DEBIT", "500", "Deposit returned")
            .await,
        StatusCode::SEE_OTHER
    );
    let (_, body) = client.get("/cash-flows?period=all-time").await;
    assert!(body.contains("Deposit returned"));
    assert!(body.contains("-$500.00"));
}

#[tokio::test]
async fn test_invalid_cash_flows_are_rejected() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;

    assert_eq!(
        client.create_cash_flow(id, "2024-13-01", "RENT", "", "1500", "").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.create_cash_flow(id, "2024-01-01", "RENT", "", "-10", "").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.create_cash_flow(id, "2024-01-01", "RENT", "SIDEWAYS", "10", "").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        client.create_cash_flow(id + 100, "2024-01-01", "RENT", "", "10", "").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(client.count_rows("cash_flows"), 0);
}

#[tokio::test]
async fn test_out_of_range_amounts_are_rejected() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;
    let property_id = id.to_string();

    for amount in ["1e30", "99999999999999999999"] {
        let response = client
            .post_form(
                "/cash-flows/create",
                &[
                    ("property_id", property_id.as_str()),
                    ("date", "2024-01-05"),
                    ("category", "RENT"),
                    ("direction", ""),
                    ("amount", amount),
                    ("description", ""),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.body.contains("Amount must be a number"));
    }
    assert_eq!(client.count_rows("cash_flows"), 0);

    let (status, summary) = client
        .get_json("/api/reports/summary?period=custom&from_date=2024-01-01&to_date=2024-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_income_cents"], 0);
}

#[tokio::test]
async fn test_page_number_is_clamped() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;
    client.create_cash_flow(id, "2024-01-05", "RENT", "", "1500", "Birch rent").await;

    let (status, body) = client.get("/cash-flows?page=9223372036854775807").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Birch rent"));
    assert!(body.contains("Page 1 of 1"));

    let (status, body) = client.get("/cash-flows?page=-9223372036854775808").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Birch rent"));
}

#[tokio::test]
async fn test_list_filters_by_property_and_search() {
    let client = TestClient::new();
    let birch = client.create_property("Birch House", "250000").await;
    let cedar = client.create_property("Cedar Lofts", "180000").await;

    client.create_cash_flow(birch, "2024-01-05", "RENT", "", "1500", "Birch rent").await;
    client.create_cash_flow(cedar, "2024-01-06", "RENT", "", "900", "Cedar rent").await;
    client.create_cash_flow(cedar, "2024-01-20", "REPAIR", "", "300", "Leaky tap").await;

    let (status, body) = client.get(&format!("/cash-flows?property_id={}", cedar)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Cedar rent"));
    assert!(body.contains("Leaky tap"));
    assert!(!body.contains("Birch rent"));
    assert!(body.contains("2 cash flows"));

    let (_, body) = client.get("/cash-flows?search=tap").await;
    assert!(body.contains("Leaky tap"));
    assert!(!body.contains("Cedar rent"));

    let (_, body) = client
        .get("/cash-flows?period=custom&from_date=2024-01-10&to_date=2024-01-31")
        .await;
    assert!(body.contains("Leaky tap"));
    assert!(!body.contains("Birch rent"));
}

#[tokio::test]
async fn test_edit_update_and_delete() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;
    client.create_cash_flow(id, "2024-03-01", "UTILITIES", "", "120.5", "Water").await;

    let cf_id: i64 = {
        let conn = client.state.db.get().unwrap();
        conn.query_row("SELECT id FROM cash_flows", [], |row| row.get(0)).unwrap()
    };

    let (status, body) = client.get(&format!("/cash-flows/{}/edit", cf_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("120.50"));

    let pid = id.to_string();
    let response = client
        .post_form(
            &format!("/cash-flows/{}/update", cf_id),
            &[
                ("property_id", pid.as_str()),
                ("date", "2024-03-02"),
                ("category", "UTILITIES"),
                ("direction", ""),
                ("amount", "130"),
                ("description", "Water and sewer"),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        response.location.as_deref(),
        Some(format!("/cash-flows?property_id={}", id).as_str())
    );

    let (_, body) = client.get("/cash-flows?period=all-time").await;
    assert!(body.contains("Water and sewer"));

    assert_eq!(client.delete(&format!("/cash-flows/{}", cf_id)).await, StatusCode::OK);
    assert_eq!(client.delete(&format!("/cash-flows/{}", cf_id)).await, StatusCode::NOT_FOUND);
    assert_eq!(client.count_rows("cash_flows"), 0);
}

#[tokio::test]
async fn test_new_form_preselects_property() {
    let client = TestClient::new();
    let id = client.create_property("Birch House", "250000").await;

    let (status, body) = client.get(&format!("/cash-flows/new?property_id={}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(&format!("<option value=\"{}\" selected>Birch House</option>", id)));
    assert!(body.contains("OTHER_EXPENSE"));
}
