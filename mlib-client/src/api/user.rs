//! Signed-in user resource

use crate::error::ApiError;
use crate::http::HttpClient;
use mlib_common::models::User;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserApi {
    client: Arc<HttpClient>,
}

impl UserApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// Fetch the user the current token belongs to (`GET user`)
    pub async fn get_user(&self) -> Result<User, ApiError> {
        self.client.get("user").await
    }
}
