//! In-process fake of the media library REST API
//!
//! Binds an axum server to 127.0.0.1:0 and records the `X-Api-Key` header of
//! every request so tests can assert on what the client sent.

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use mlib_client::store::Store;
use mlib_common::config::StoreConfig;
use mlib_common::storage::ClientStorage;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "secret";
pub const VALID_TOKEN: &str = "tok-123";

/// Delay before the slow routes answer 401
pub const REJECT_DELAY: Duration = Duration::from_millis(300);

#[derive(Default)]
pub struct FakeState {
    /// `X-Api-Key` value of each request, in arrival order
    pub seen_keys: Mutex<Vec<Option<String>>>,
    pub hits: AtomicUsize,
    pub series: Mutex<Vec<Value>>,
    /// Answer 500 on series routes
    pub fail_series: AtomicBool,
    /// Answer 401 on every route except authenticate
    pub reject_all: AtomicBool,
    /// Answer 401 on `user` after `REJECT_DELAY`
    pub reject_user_slowly: AtomicBool,
}

impl FakeState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn seen_keys(&self) -> Vec<Option<String>> {
        self.seen_keys.lock().unwrap().clone()
    }

    fn record(&self, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        let key = headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen_keys.lock().unwrap().push(key);
    }

    fn rejected(&self) -> Option<Response> {
        if self.reject_all.load(Ordering::SeqCst) {
            Some(
                (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid API key"})))
                    .into_response(),
            )
        } else {
            None
        }
    }

    fn series_failure(&self) -> Option<Response> {
        if self.fail_series.load(Ordering::SeqCst) {
            Some(
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Database is locked", "stack": "at listSeries"})),
                )
                    .into_response(),
            )
        } else {
            None
        }
    }
}

pub struct FakeApi {
    pub addr: SocketAddr,
    pub state: Arc<FakeState>,
}

impl FakeApi {
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        *state.series.lock().unwrap() = vec![
            json!({"id": 1, "title": "Northern Lights", "status": "Ended", "network": "NRK"}),
            json!({"id": 2, "title": "Harbour Watch", "status": "Active"}),
        ];

        let app = Router::new()
            .route("/api/v2/authenticate", axum::routing::post(authenticate))
            .route("/api/v2/series", get(list_series).post(create_series))
            .route("/api/v2/series/:id", get(get_series))
            .route("/api/v2/config", get(get_config))
            .route("/api/v2/user", get(get_user))
            .route("/api/v2/echo", get(echo))
            .route("/api/v2/slow", get(slow))
            .route("/api/v2/slow-reject", get(slow_reject))
            .route("/api/v2/plain-error", get(plain_error))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn api_root(&self) -> String {
        format!("http://{}/api/v2/", self.addr)
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig {
            api_root: self.api_root(),
            timeout_secs: 1,
            recent_capacity: 3,
            ..StoreConfig::default()
        }
    }

    pub fn store(&self, storage: Arc<dyn ClientStorage>) -> Store {
        Store::new(&self.config(), storage).unwrap()
    }
}

async fn authenticate(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&headers);
    if body["username"] == USERNAME && body["password"] == PASSWORD {
        Json(json!({"token": VALID_TOKEN})).into_response()
    } else if body["username"] == "tokenless" {
        Json(json!({})).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"}))).into_response()
    }
}

async fn list_series(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    if let Some(response) = state.rejected().or_else(|| state.series_failure()) {
        return response;
    }
    Json(Value::Array(state.series.lock().unwrap().clone())).into_response()
}

async fn get_series(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    state.record(&headers);
    if let Some(response) = state.rejected().or_else(|| state.series_failure()) {
        return response;
    }
    let found = state
        .series
        .lock()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id)
        .cloned();
    match found {
        Some(series) => Json(series).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"error": "Series not found"}))).into_response(),
    }
}

async fn create_series(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&headers);
    if let Some(response) = state.rejected().or_else(|| state.series_failure()) {
        return response;
    }
    let mut series = state.series.lock().unwrap();
    let id = series.len() as u64 + 1;
    let created = json!({"id": id, "title": body["title"], "status": "active"});
    series.push(created.clone());
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn get_config(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    if let Some(response) = state.rejected() {
        return response;
    }
    Json(json!({"webRoot": "/", "subtitles": {"enabled": true}})).into_response()
}

async fn get_user(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    if state.reject_user_slowly.load(Ordering::SeqCst) {
        tokio::time::sleep(REJECT_DELAY).await;
        return unauthorized();
    }
    if let Some(response) = state.rejected() {
        return response;
    }
    Json(json!({"username": USERNAME, "locale": "en"})).into_response()
}

async fn echo(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    if let Some(response) = state.rejected() {
        return response;
    }
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "apiKey": header("x-api-key"),
        "accept": header("accept"),
        "contentType": header("content-type"),
    }))
    .into_response()
}

async fn slow(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    tokio::time::sleep(Duration::from_secs(3)).await;
    Json(json!({})).into_response()
}

async fn slow_reject(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    tokio::time::sleep(REJECT_DELAY).await;
    unauthorized()
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid API key"}))).into_response()
}

async fn plain_error(State(state): State<Arc<FakeState>>, headers: HeaderMap) -> Response {
    state.record(&headers);
    (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
}
