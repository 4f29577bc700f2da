//! # MLIB Common Library
//!
//! Shared code for the media library client crates including:
//! - Error and result types
//! - Configuration loading (CLI / environment / TOML / defaults)
//! - Durable client storage (token, recently viewed series)
//! - Resource models exchanged with the REST API
//! - Store event types and the event bus

pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod storage;

pub use error::{Error, Result};
pub use storage::{ClientStorage, FileStorage, MemoryStorage};
