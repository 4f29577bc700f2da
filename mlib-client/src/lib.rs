//! # MLIB Client
//!
//! Client-side state layer of the media library:
//! - `http`: HTTP client adapter (base URL, timeout, JSON, `X-Api-Key`)
//! - `api`: one domain API module per REST resource
//! - `store`: store modules (state, mutations, actions) and the store root
//!
//! # Example
//!
//! ```ignore
//! use mlib_client::store::{Action, Store};
//! use mlib_common::config::StoreConfig;
//! use mlib_common::FileStorage;
//! use std::sync::Arc;
//!
//! let config = StoreConfig::default();
//! let storage = Arc::new(FileStorage::open(&config.storage_path)?);
//! let store = Store::new(&config, storage)?;
//! store.dispatch(Action::CheckAuth).await?;
//! store.dispatch(Action::FetchSeriesList).await?;
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod store;

pub use error::ApiError;
pub use http::HttpClient;
pub use store::{Action, ActionOutcome, Mutation, RootState, Store};
