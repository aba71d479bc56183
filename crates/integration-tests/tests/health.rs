//! Integration tests for the health endpoints.
//!
//! These tests require the web server running (cargo run -p woodshop-web)
//! with a reachable `PostgreSQL` database.

use reqwest::StatusCode;
use woodshop_integration_tests::{base_url, client};

#[tokio::test]
#[ignore = "Requires running web server"]
async fn test_health_returns_ok() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .expect("Failed to call /health");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_readiness_checks_database() {
    let resp = client()
        .expect("Failed to create HTTP client")
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to call /health/ready");

    assert_eq!(resp.status(), StatusCode::OK);
}
