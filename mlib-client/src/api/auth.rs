//! Authentication resource

use crate::error::ApiError;
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Clone)]
pub struct AuthApi {
    client: Arc<HttpClient>,
}

impl AuthApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Exchange credentials for an API token (`POST authenticate`)
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response: TokenResponse = self
            .client
            .post("authenticate", &Credentials { username, password })
            .await?;

        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                ApiError::Decode("authentication response did not include a token".to_string())
            })?;

        info!(username = %username, "Authenticated");
        Ok(token)
    }
}
