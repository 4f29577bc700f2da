//! Session store module
//!
//! Auth actions are serialized through an async gate: a sign-in and a
//! sign-out issued concurrently run one after the other, in the order they
//! acquired the gate, so the stored token and the state slice always agree
//! with the last action to finish.

use crate::api::AuthApi;
use crate::error::ApiError;
use mlib_common::events::{EventBus, ModuleKey, StoreEvent};
use mlib_common::models::Failure;
use mlib_common::storage::{ClientStorage, TOKEN_KEY};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Session slice of the state tree
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthState {
    pub token: Option<String>,
    pub is_authenticated: bool,
    pub failure: Option<Failure>,
}

/// Session mutations
#[derive(Debug, Clone, PartialEq)]
pub enum AuthMutation {
    LoginSuccess(String),
    Logout,
    LoginFailure(Failure),
}

impl AuthMutation {
    pub fn name(&self) -> &'static str {
        match self {
            AuthMutation::LoginSuccess(_) => "login_success",
            AuthMutation::Logout => "logout",
            AuthMutation::LoginFailure(_) => "login_failure",
        }
    }
}

impl AuthState {
    /// Apply a mutation
    pub fn apply(&mut self, mutation: AuthMutation) {
        match mutation {
            AuthMutation::LoginSuccess(token) => {
                self.token = Some(token);
                self.is_authenticated = true;
                self.failure = None;
            }
            AuthMutation::Logout => {
                self.token = None;
                self.is_authenticated = false;
                self.failure = None;
            }
            // Prior session stays as it was
            AuthMutation::LoginFailure(failure) => {
                self.failure = Some(failure);
            }
        }
    }
}

pub struct AuthModule {
    state: RwLock<AuthState>,
    gate: Mutex<()>,
    api: AuthApi,
    storage: Arc<dyn ClientStorage>,
    events: Arc<EventBus>,
}

impl AuthModule {
    pub fn new(api: AuthApi, storage: Arc<dyn ClientStorage>, events: Arc<EventBus>) -> Self {
        Self {
            state: RwLock::new(AuthState::default()),
            gate: Mutex::new(()),
            api,
            storage,
            events,
        }
    }

    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn commit(&self, mutation: AuthMutation) {
        let name = mutation.name();
        self.state.write().await.apply(mutation);
        self.events.emit_lossy(StoreEvent::now(ModuleKey::Auth, name));
    }

    /// Sign in and persist the returned token
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let _gate = self.gate.lock().await;

        let token = match self.api.authenticate(username, password).await {
            Ok(token) => token,
            Err(e) => {
                self.commit(AuthMutation::LoginFailure(e.failure())).await;
                return Err(e);
            }
        };

        if let Err(e) = self.storage.set(TOKEN_KEY, &token) {
            let err = ApiError::from(e);
            self.commit(AuthMutation::LoginFailure(err.failure())).await;
            return Err(err);
        }

        self.commit(AuthMutation::LoginSuccess(token.clone())).await;
        info!(username = %username, "Signed in");
        Ok(token)
    }

    /// Sign out: forget the stored token and the session
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _gate = self.gate.lock().await;

        let removed = self.storage.remove(TOKEN_KEY);
        self.commit(AuthMutation::Logout).await;
        info!("Signed out");

        removed.map_err(ApiError::from)
    }

    /// Restore the session from storage without contacting the server
    ///
    /// Returns whether a session is active afterwards. A stored token is
    /// trusted as-is and never rewritten.
    pub async fn check_auth(&self) -> bool {
        let _gate = self.gate.lock().await;

        match self.storage.get(TOKEN_KEY) {
            Some(token) => {
                self.commit(AuthMutation::LoginSuccess(token)).await;
                true
            }
            None => {
                self.commit(AuthMutation::Logout).await;
                false
            }
        }
    }

    /// Drop the session after the server rejected the token with 401
    ///
    /// The HTTP client has already removed the stored token. If a sign-in
    /// stored a fresh token since then, that newer session is kept.
    pub async fn invalidate_session(&self) {
        let _gate = self.gate.lock().await;

        if self.storage.get(TOKEN_KEY).is_some() {
            debug!("Token was replaced after the 401, keeping the new session");
            return;
        }

        warn!("Session invalidated by unauthorized response");
        self.commit(AuthMutation::Logout).await;
    }
}
