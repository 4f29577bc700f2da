//! HTTP client adapter for the media library REST API
//!
//! Wraps `reqwest` with:
//! - a fixed base URL (relative paths are appended to it)
//! - a fixed per-request timeout
//! - JSON `Accept` / `Content-Type` headers
//! - `X-Api-Key` taken from durable storage on every request
//!
//! A 401 response removes the stored token before the error is returned,
//! unless a different token was stored while the request was in flight.
//! Requests are never retried.

use crate::error::ApiError;
use mlib_common::config::StoreConfig;
use mlib_common::models::Failure;
use mlib_common::storage::{ClientStorage, TOKEN_KEY};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Header carrying the API token (not a bearer scheme)
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Shared HTTP client used by every domain API module
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    storage: Arc<dyn ClientStorage>,
}

impl HttpClient {
    pub fn new(config: &StoreConfig, storage: Arc<dyn ClientStorage>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.api_root.clone(),
            timeout: config.timeout(),
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API root
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and decode the JSON response body
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut request = self.http.request(method.clone(), &url);

        let sent_token = self.storage.get(TOKEN_KEY);
        if let Some(token) = &sent_token {
            request = request.header(API_KEY_HEADER, token.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(method = %method, url = %url, "Sending API request");

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // Only the token this request carried is discarded; a newer one
            // stored while the request was in flight stays.
            if let Some(token) = &sent_token {
                match self.storage.remove_if_eq(TOKEN_KEY, token) {
                    Ok(true) => debug!("Discarded rejected token"),
                    Ok(false) => debug!("Token replaced while request was in flight, keeping it"),
                    Err(e) => warn!(error = %e, "Failed to discard stored token after 401"),
                }
            }
            let failure = read_failure(response, status).await;
            warn!(method = %method, url = %url, error = %failure, "API request unauthorized");
            return Err(ApiError::Unauthorized(failure));
        }

        if !status.is_success() {
            let failure = read_failure(response, status).await;
            warn!(
                method = %method,
                url = %url,
                status = status.as_u16(),
                error = %failure,
                "API request failed"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                failure,
            });
        }

        let bytes = response.bytes().await.map_err(|e| self.classify(e))?;
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };

        serde_json::from_slice(payload)
            .map_err(|e| ApiError::Decode(format!("{} {}: {}", method, url, e)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
        self.request(Method::POST, path, Some(&body)).await
    }

    fn classify(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Extract the server's `{error, stack}` body, falling back to the raw text
async fn read_failure(response: Response, status: StatusCode) -> Failure {
    let text = response.text().await.unwrap_or_default();

    if let Ok(failure) = serde_json::from_str::<Failure>(&text) {
        return failure;
    }

    let text = text.trim();
    if text.is_empty() {
        Failure::new(status.canonical_reason().unwrap_or("Request failed"))
    } else {
        Failure::new(text)
    }
}
