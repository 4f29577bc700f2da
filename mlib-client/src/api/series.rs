//! Series resource

use crate::error::ApiError;
use crate::http::HttpClient;
use mlib_common::models::{NewSeries, Series, SeriesId};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct SeriesApi {
    client: Arc<HttpClient>,
}

impl SeriesApi {
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    /// All series in the library (`GET series`)
    pub async fn list(&self) -> Result<Vec<Series>, ApiError> {
        let series: Vec<Series> = self.client.get("series").await?;
        debug!(count = series.len(), "Fetched series list");
        Ok(series)
    }

    /// A single series (`GET series/{id}`)
    pub async fn get(&self, id: SeriesId) -> Result<Series, ApiError> {
        self.client.get(&format!("series/{}", id)).await
    }

    /// Add a series to the library (`POST series`)
    pub async fn create(&self, series: &NewSeries) -> Result<Series, ApiError> {
        let created: Series = self.client.post("series", series).await?;
        info!(id = created.id, title = %created.title, "Added series");
        Ok(created)
    }
}
