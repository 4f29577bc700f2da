//! Signed-in user store module

use crate::api::UserApi;
use crate::error::ApiError;
use mlib_common::events::{EventBus, ModuleKey, StoreEvent};
use mlib_common::models::{Failure, User};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserState {
    pub user: Option<User>,
    pub failure: Option<Failure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserMutation {
    ReceiveUser(User),
    UserFailure(Failure),
}

impl UserMutation {
    pub fn name(&self) -> &'static str {
        match self {
            UserMutation::ReceiveUser(_) => "receive_user",
            UserMutation::UserFailure(_) => "user_failure",
        }
    }
}

impl UserState {
    pub fn apply(&mut self, mutation: UserMutation) {
        match mutation {
            UserMutation::ReceiveUser(user) => {
                self.user = Some(user);
                self.failure = None;
            }
            UserMutation::UserFailure(failure) => self.failure = Some(failure),
        }
    }
}

pub struct UserModule {
    state: RwLock<UserState>,
    api: UserApi,
    events: Arc<EventBus>,
}

impl UserModule {
    pub fn new(api: UserApi, events: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(UserState::default()),
            api,
            events,
        }
    }

    pub async fn state(&self) -> UserState {
        self.state.read().await.clone()
    }

    pub async fn commit(&self, mutation: UserMutation) {
        let name = mutation.name();
        self.state.write().await.apply(mutation);
        self.events.emit_lossy(StoreEvent::now(ModuleKey::User, name));
    }

    pub async fn fetch_user(&self) -> Result<User, ApiError> {
        match self.api.get_user().await {
            Ok(user) => {
                self.commit(UserMutation::ReceiveUser(user.clone())).await;
                Ok(user)
            }
            Err(e) => {
                self.commit(UserMutation::UserFailure(e.failure())).await;
                Err(e)
            }
        }
    }
}
