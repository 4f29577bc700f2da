//! Server configuration store module

use crate::api::ConfigApi;
use crate::error::ApiError;
use mlib_common::events::{EventBus, ModuleKey, StoreEvent};
use mlib_common::models::{ConfigSnapshot, Failure};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigState {
    pub config: ConfigSnapshot,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigMutation {
    ReceiveConfig(ConfigSnapshot),
    ConfigFailure(Failure),
}

impl ConfigMutation {
    pub fn name(&self) -> &'static str {
        match self {
            ConfigMutation::ReceiveConfig(_) => "receive_config",
            ConfigMutation::ConfigFailure(_) => "config_failure",
        }
    }
}

impl ConfigState {
    pub fn apply(&mut self, mutation: ConfigMutation) {
        match mutation {
            ConfigMutation::ReceiveConfig(config) => {
                self.config = config;
                self.failure = None;
            }
            ConfigMutation::ConfigFailure(failure) => self.failure = Some(failure),
        }
    }
}

pub struct ConfigModule {
    state: RwLock<ConfigState>,
    api: ConfigApi,
    events: Arc<EventBus>,
}

impl ConfigModule {
    pub fn new(api: ConfigApi, events: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(ConfigState::default()),
            api,
            events,
        }
    }

    pub async fn state(&self) -> ConfigState {
        self.state.read().await.clone()
    }

    pub async fn commit(&self, mutation: ConfigMutation) {
        let name = mutation.name();
        self.state.write().await.apply(mutation);
        self.events.emit_lossy(StoreEvent::now(ModuleKey::Config, name));
    }

    /// Replace the snapshot with the server's current configuration
    pub async fn fetch_config(&self) -> Result<ConfigSnapshot, ApiError> {
        match self.api.get_config().await {
            Ok(config) => {
                self.commit(ConfigMutation::ReceiveConfig(config.clone())).await;
                Ok(config)
            }
            Err(e) => {
                self.commit(ConfigMutation::ConfigFailure(e.failure())).await;
                Err(e)
            }
        }
    }
}
