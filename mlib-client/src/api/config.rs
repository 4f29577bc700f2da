//! Server configuration resource

use crate::error::ApiError;
use crate::http::HttpClient;
use mlib_common::models::ConfigSnapshot;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConfigApi {
    client: Arc<HttpClient>,
}

impl ConfigApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Fetch the full server configuration (`GET config`)
    pub async fn get_config(&self) -> Result<ConfigSnapshot, ApiError> {
        self.client.get("config").await
    }
}
