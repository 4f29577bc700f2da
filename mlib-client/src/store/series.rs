//! Series store module
//!
//! Holds the series collection (unique by id) and the recently viewed list.
//! The recent list is read from durable storage when the module is built and
//! written back on every change.

use crate::api::SeriesApi;
use crate::error::ApiError;
use mlib_common::events::{EventBus, ModuleKey, StoreEvent};
use mlib_common::models::{Failure, NewSeries, RecentSeries, Series, SeriesId, SeriesStatus};
use mlib_common::storage::{get_json, set_json, ClientStorage, RECENT_SERIES_KEY};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

// ========================================
// Recent list
// ========================================

/// Bounded most-recent-first list of viewed series
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentList {
    entries: Vec<RecentSeries>,
    capacity: usize,
}

impl RecentList {
    /// Empty list; a capacity of 0 is raised to 1
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// List seeded from previously stored entries, truncated to capacity
    pub fn from_entries(entries: Vec<RecentSeries>, capacity: usize) -> Self {
        let mut list = Self::new(capacity);
        for entry in entries.into_iter().rev() {
            list.push(entry);
        }
        list
    }

    /// Put `entry` first; an older entry with the same id is dropped and the
    /// oldest entry is evicted once capacity is exceeded
    pub fn push(&mut self, entry: RecentSeries) {
        self.entries.retain(|existing| existing.id != entry.id);
        self.entries.insert(0, entry);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[RecentSeries] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ========================================
// State and mutations
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesState {
    pub series: Vec<Series>,
    pub recent: RecentList,
    pub failure: Option<Failure>,
}

impl SeriesState {
    pub fn new(recent: RecentList) -> Self {
        Self {
            series: Vec::new(),
            recent,
            failure: None,
        }
    }

    pub fn find(&self, id: SeriesId) -> Option<&Series> {
        self.series.iter().find(|series| series.id == id)
    }

    pub fn series_active(&self) -> Vec<&Series> {
        self.with_status(&SeriesStatus::Active)
    }

    pub fn series_ended(&self) -> Vec<&Series> {
        self.with_status(&SeriesStatus::Ended)
    }

    fn with_status(&self, status: &SeriesStatus) -> Vec<&Series> {
        self.series.iter().filter(|series| &series.status == status).collect()
    }

    pub fn apply(&mut self, mutation: SeriesMutation) {
        match mutation {
            SeriesMutation::ReceiveSeriesList(list) => {
                let mut index: HashMap<SeriesId, usize> = HashMap::with_capacity(list.len());
                let mut unique: Vec<Series> = Vec::with_capacity(list.len());
                for series in list {
                    match index.get(&series.id) {
                        Some(&pos) => unique[pos] = series,
                        None => {
                            index.insert(series.id, unique.len());
                            unique.push(series);
                        }
                    }
                }
                self.series = unique;
                self.failure = None;
            }
            SeriesMutation::ReceiveSeries(series) => {
                match self.series.iter().position(|existing| existing.id == series.id) {
                    Some(pos) => self.series[pos] = series,
                    None => self.series.push(series),
                }
                self.failure = None;
            }
            SeriesMutation::ReceiveRecent(entry) => self.recent.push(entry),
            SeriesMutation::SeriesFailure(failure) => self.failure = Some(failure),
        }
    }
}

impl Default for SeriesState {
    fn default() -> Self {
        Self::new(RecentList::new(mlib_common::config::DEFAULT_RECENT_CAPACITY))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeriesMutation {
    /// Replace the whole collection
    ReceiveSeriesList(Vec<Series>),
    /// Replace the record with the same id, or append it
    ReceiveSeries(Series),
    ReceiveRecent(RecentSeries),
    SeriesFailure(Failure),
}

impl SeriesMutation {
    pub fn name(&self) -> &'static str {
        match self {
            SeriesMutation::ReceiveSeriesList(_) => "receive_series_list",
            SeriesMutation::ReceiveSeries(_) => "receive_series",
            SeriesMutation::ReceiveRecent(_) => "receive_recent",
            SeriesMutation::SeriesFailure(_) => "series_failure",
        }
    }
}

// ========================================
// Module
// ========================================

pub struct SeriesModule {
    state: RwLock<SeriesState>,
    api: SeriesApi,
    storage: Arc<dyn ClientStorage>,
    events: Arc<EventBus>,
}

impl SeriesModule {
    pub fn new(
        api: SeriesApi,
        storage: Arc<dyn ClientStorage>,
        events: Arc<EventBus>,
        recent_capacity: usize,
    ) -> Self {
        let stored: Vec<RecentSeries> =
            get_json(storage.as_ref(), RECENT_SERIES_KEY).unwrap_or_default();
        debug!(count = stored.len(), "Loaded recent series from storage");

        Self {
            state: RwLock::new(SeriesState::new(RecentList::from_entries(
                stored,
                recent_capacity,
            ))),
            api,
            storage,
            events,
        }
    }

    pub async fn state(&self) -> SeriesState {
        self.state.read().await.clone()
    }

    pub async fn commit(&self, mutation: SeriesMutation) {
        let name = mutation.name();
        self.state.write().await.apply(mutation);
        self.events.emit_lossy(StoreEvent::now(ModuleKey::Series, name));
    }

    pub async fn fetch_series_list(&self) -> Result<Vec<Series>, ApiError> {
        match self.api.list().await {
            Ok(list) => {
                self.commit(SeriesMutation::ReceiveSeriesList(list.clone())).await;
                Ok(list)
            }
            Err(e) => {
                self.commit(SeriesMutation::SeriesFailure(e.failure())).await;
                Err(e)
            }
        }
    }

    pub async fn fetch_series(&self, id: SeriesId) -> Result<Series, ApiError> {
        match self.api.get(id).await {
            Ok(series) => {
                self.commit(SeriesMutation::ReceiveSeries(series.clone())).await;
                Ok(series)
            }
            Err(e) => {
                self.commit(SeriesMutation::SeriesFailure(e.failure())).await;
                Err(e)
            }
        }
    }

    pub async fn create_series(&self, new_series: NewSeries) -> Result<Series, ApiError> {
        match self.api.create(&new_series).await {
            Ok(series) => {
                self.commit(SeriesMutation::ReceiveSeries(series.clone())).await;
                Ok(series)
            }
            Err(e) => {
                self.commit(SeriesMutation::SeriesFailure(e.failure())).await;
                Err(e)
            }
        }
    }

    /// Record `series` as most recently viewed and persist the list
    ///
    /// Storage is written before the state changes, so a failed write leaves
    /// both untouched.
    pub async fn add_recent(&self, series: &Series) -> Result<(), ApiError> {
        let entry = RecentSeries::from(series);
        let mut state = self.state.write().await;

        let mut next = state.recent.clone();
        next.push(entry.clone());
        set_json(self.storage.as_ref(), RECENT_SERIES_KEY, next.entries())?;

        let mutation = SeriesMutation::ReceiveRecent(entry);
        let name = mutation.name();
        state.apply(mutation);
        drop(state);

        self.events.emit_lossy(StoreEvent::now(ModuleKey::Series, name));
        Ok(())
    }

    /// Fetch a series and record it as recently viewed
    pub async fn open_series(&self, id: SeriesId) -> Result<Series, ApiError> {
        let series = self.fetch_series(id).await?;
        if let Err(e) = self.add_recent(&series).await {
            self.commit(SeriesMutation::SeriesFailure(e.failure())).await;
            return Err(e);
        }
        Ok(series)
    }
}
