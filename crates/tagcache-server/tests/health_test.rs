mod helpers;

use axum::http::StatusCode;
use helpers::{client, disabled_client};
use tagcache_server::HealthResponse;

#[tokio::test]
async fn health_check_returns_200() {
    client().await.get("/health").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn health_check_returns_json() {
    client()
        .await
        .get("/health")
        .await
        .assert_content_type_contains("application/json");
}

#[tokio::test]
async fn health_check_body_contains_status_up() {
    let health: serde_json::Value = client().await.get("/health").await.json();
    assert_eq!(health["status"], "UP");
}

#[tokio::test]
async fn disabled_cache_is_still_healthy() {
    let response = disabled_client().await.get("/health").await;

    response.assert_status(StatusCode::OK);
    let health: serde_json::Value = response.json();
    assert_eq!(health["status"], "DISABLED");
}

#[test]
fn health_response_serializes_correctly() {
    let json = serde_json::to_string(&HealthResponse::default()).unwrap();
    assert_eq!(json, r#"{"status":"UP"}"#);
}

#[tokio::test]
async fn metrics_endpoint_renders_text() {
    client()
        .await
        .get("/metrics")
        .await
        .assert_status(StatusCode::OK);
}
