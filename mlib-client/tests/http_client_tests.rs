//! HTTP client adapter tests against the in-process fake API
//!
//! Tests cover:
//! - `X-Api-Key` attached from storage on every request
//! - Token removed from storage after a 401
//! - JSON headers, server error bodies, timeouts, transport failures

mod common;

use common::{FakeApi, REJECT_DELAY, VALID_TOKEN};
use mlib_client::{ApiError, HttpClient};
use mlib_common::config::StoreConfig;
use mlib_common::models::Failure;
use mlib_common::storage::{ClientStorage, TOKEN_KEY};
use mlib_common::MemoryStorage;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn client(config: &StoreConfig, storage: Arc<MemoryStorage>) -> HttpClient {
    HttpClient::new(config, storage).unwrap()
}

#[tokio::test]
async fn test_api_key_header_follows_stored_token() {
    let api = FakeApi::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client(&api.config(), storage.clone());

    let _: Value = client.get("echo").await.unwrap();

    storage.set(TOKEN_KEY, VALID_TOKEN).unwrap();
    let body: Value = client.get("echo").await.unwrap();
    assert_eq!(body["apiKey"], VALID_TOKEN);

    storage.set(TOKEN_KEY, "rotated").unwrap();
    let _: Value = client.get("/echo").await.unwrap();

    assert_eq!(
        api.state.seen_keys(),
        vec![None, Some(VALID_TOKEN.to_string()), Some("rotated".to_string())]
    );
}

#[tokio::test]
async fn test_json_headers_are_sent() {
    let api = FakeApi::start().await;
    let client = client(&api.config(), Arc::new(MemoryStorage::new()));

    let body: Value = client.get("echo").await.unwrap();
    assert_eq!(body["accept"], "application/json");
    assert_eq!(body["contentType"], "application/json");
}

#[tokio::test]
async fn test_unauthorized_discards_token() {
    let api = FakeApi::start().await;
    let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "expired")]));
    let client = client(&api.config(), storage.clone());

    api.state.reject_all.store(true, Ordering::SeqCst);
    let err = client.get::<Value>("echo").await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.failure(), Failure::new("Invalid API key"));
    assert_eq!(storage.get(TOKEN_KEY), None);

    // Next request goes out without the header
    api.state.reject_all.store(false, Ordering::SeqCst);
    let _: Value = client.get("echo").await.unwrap();
    assert_eq!(
        api.state.seen_keys(),
        vec![Some("expired".to_string()), None]
    );
}

#[tokio::test]
async fn test_stale_unauthorized_keeps_newer_token() {
    let api = FakeApi::start().await;
    let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "old")]));
    let client = client(&api.config(), storage.clone());

    let (result, ()) = tokio::join!(client.get::<Value>("slow-reject"), async {
        tokio::time::sleep(REJECT_DELAY / 3).await;
        storage.set(TOKEN_KEY, "new").unwrap();
    });

    assert!(result.unwrap_err().is_unauthorized());
    assert_eq!(api.state.seen_keys(), vec![Some("old".to_string())]);
    assert_eq!(storage.get(TOKEN_KEY), Some("new".to_string()));
}

#[tokio::test]
async fn test_unauthorized_without_token_leaves_storage_alone() {
    let api = FakeApi::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let client = client(&api.config(), storage.clone());

    let (result, ()) = tokio::join!(client.get::<Value>("slow-reject"), async {
        tokio::time::sleep(REJECT_DELAY / 3).await;
        storage.set(TOKEN_KEY, VALID_TOKEN).unwrap();
    });

    assert!(result.unwrap_err().is_unauthorized());
    assert_eq!(storage.get(TOKEN_KEY), Some(VALID_TOKEN.to_string()));
}

#[tokio::test]
async fn test_server_error_body_is_extracted() {
    let api = FakeApi::start().await;
    let client = client(&api.config(), Arc::new(MemoryStorage::new()));
    api.state.fail_series.store(true, Ordering::SeqCst);

    let err = client.get::<Value>("series").await.unwrap_err();
    match err {
        ApiError::Status { status, failure } => {
            assert_eq!(status, 500);
            assert_eq!(failure, Failure::with_stack("Database is locked", "at listSeries"));
        }
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let api = FakeApi::start().await;
    let client = client(&api.config(), Arc::new(MemoryStorage::new()));

    let err = client.get::<Value>("plain-error").await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.failure(), Failure::new("upstream unavailable"));
}

#[tokio::test]
async fn test_timeout_is_reported() {
    let api = FakeApi::start().await;
    let client = client(&api.config(), Arc::new(MemoryStorage::new()));

    let err = client.get::<Value>("slow").await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout(_)), "got {:?}", err);
    assert_eq!(api.state.hits(), 1, "requests are never retried");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = StoreConfig {
        api_root: format!("http://{}/api/v2/", addr),
        timeout_secs: 1,
        ..StoreConfig::default()
    };
    let client = client(&config, Arc::new(MemoryStorage::new()));

    let err = client.get::<Value>("series").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unexpected_shape_is_decode_error() {
    let api = FakeApi::start().await;
    let client = client(&api.config(), Arc::new(MemoryStorage::new()));

    let err = client.get::<Vec<u64>>("config").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}
