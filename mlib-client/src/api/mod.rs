//! Domain API modules
//!
//! One module per REST resource. Each call goes through the shared
//! [`HttpClient`], decodes the typed result and hands every error back to the
//! caller unchanged.

pub mod auth;
pub mod config;
pub mod series;
pub mod user;

pub use auth::AuthApi;
pub use config::ConfigApi;
pub use series::SeriesApi;
pub use user::UserApi;

use crate::http::HttpClient;
use std::sync::Arc;

/// All domain API modules sharing one HTTP client
#[derive(Clone)]
pub struct Api {
    pub auth: AuthApi,
    pub config: ConfigApi,
    pub series: SeriesApi,
    pub user: UserApi,
}

impl Api {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            auth: AuthApi::new(client.clone()),
            config: ConfigApi::new(client.clone()),
            series: SeriesApi::new(client.clone()),
            user: UserApi::new(client),
        }
    }
}
