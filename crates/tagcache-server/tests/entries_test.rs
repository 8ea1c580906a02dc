//! Entry endpoint tests.

mod helpers;

use axum::http::StatusCode;
use helpers::{assert_error_body, client, disabled_client};
use serde_json::{Value, json};

#[tokio::test]
async fn put_then_get_round_trips() {
    let client = client().await;
    let profile = json!({"id": 42, "name": "Ada"});

    client
        .put_json("/entries/profile?tags=user:42", profile.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = client.get("/entries/profile?tags=user:42").await;
    response
        .assert_status(StatusCode::OK)
        .assert_content_type_contains("application/json");
    assert_eq!(response.json::<Value>(), profile);
}

#[tokio::test]
async fn missing_entry_is_404() {
    let response = client().await.get("/entries/nothing").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_error_body(&response.json());
}

#[tokio::test]
async fn tag_order_and_spacing_do_not_matter() {
    let client = client().await;

    client
        .put_json("/entries/k?tags=b,a", json!("v"))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = client.get("/entries/k?tags=a,%20b,,a").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!("v"));
}

#[tokio::test]
async fn tags_are_part_of_the_entry_identity() {
    let client = client().await;
    client.put_json("/entries/k?tags=a", json!(1)).await;

    client.get("/entries/k").await.assert_status(StatusCode::NOT_FOUND);
    client
        .get("/entries/k?tags=a,b")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn zero_ttl_is_rejected() {
    let response = client()
        .await
        .put_json("/entries/k?ttl=0", json!(1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_body(&response.json());
}

#[tokio::test]
async fn ttl_beyond_clock_range_is_rejected() {
    let client = client().await;
    let response = client
        .put_json("/entries/k?ttl=18446744073709551615", json!(1))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_error_body(&response.json());

    // The server is still serving after the rejected write.
    client.get("/health").await.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn null_is_stored_like_any_value() {
    let client = client().await;

    client
        .put_json("/entries/k", json!(null))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = client.get("/entries/k").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>(), Value::Null);
}

#[tokio::test]
async fn post_to_an_entry_is_not_allowed() {
    client()
        .await
        .post_json("/entries/k", json!(1))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn disabled_cache_refuses_writes_and_misses_reads() {
    let client = disabled_client().await;

    let response = client.put_json("/entries/k", json!(1)).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_error_body(&response.json());

    client.get("/entries/k").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn store_outage_is_503_for_writes() {
    let client = client().await;
    client.store.set_online(false);

    client
        .put_json("/entries/k", json!(1))
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    client.get("/entries/k").await.assert_status(StatusCode::NOT_FOUND);
}
