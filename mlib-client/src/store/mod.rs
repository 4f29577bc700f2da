//! Store root
//!
//! Composes the store modules into one state tree. A `Store` is built once
//! at startup and handed to whoever needs it; there is no global instance.
//!
//! Everything that changes state goes through closed enums:
//! - [`Mutation`]: synchronous, pure state transitions, applied by `commit`
//! - [`Action`]: asynchronous operations calling the API, run by `dispatch`

pub mod auth;
pub mod config;
pub mod series;
pub mod user;

pub use auth::{AuthModule, AuthMutation, AuthState};
pub use config::{ConfigModule, ConfigMutation, ConfigState};
pub use series::{RecentList, SeriesModule, SeriesMutation, SeriesState};
pub use user::{UserModule, UserMutation, UserState};

use crate::api::Api;
use crate::error::ApiError;
use crate::http::HttpClient;
use mlib_common::config::StoreConfig;
use mlib_common::events::{EventBus, ModuleKey, StoreEvent};
use mlib_common::models::{ConfigSnapshot, NewSeries, Series, SeriesId, User};
use mlib_common::storage::ClientStorage;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Buffered store events per subscriber
const EVENT_CAPACITY: usize = 100;

/// A mutation addressed to one store module
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Auth(AuthMutation),
    Config(ConfigMutation),
    Series(SeriesMutation),
    User(UserMutation),
}

impl Mutation {
    pub fn module(&self) -> ModuleKey {
        match self {
            Mutation::Auth(_) => ModuleKey::Auth,
            Mutation::Config(_) => ModuleKey::Config,
            Mutation::Series(_) => ModuleKey::Series,
            Mutation::User(_) => ModuleKey::User,
        }
    }
}

/// Every action the store can run
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Login { username: String, password: String },
    Logout,
    CheckAuth,
    FetchConfig,
    FetchSeriesList,
    FetchSeries(SeriesId),
    CreateSeries(NewSeries),
    /// Fetch a series and record it as recently viewed
    OpenSeries(SeriesId),
    FetchUser,
}

impl Action {
    pub fn module(&self) -> ModuleKey {
        match self {
            Action::Login { .. } | Action::Logout | Action::CheckAuth => ModuleKey::Auth,
            Action::FetchConfig => ModuleKey::Config,
            Action::FetchSeriesList
            | Action::FetchSeries(_)
            | Action::CreateSeries(_)
            | Action::OpenSeries(_) => ModuleKey::Series,
            Action::FetchUser => ModuleKey::User,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "login",
            Action::Logout => "logout",
            Action::CheckAuth => "check_auth",
            Action::FetchConfig => "fetch_config",
            Action::FetchSeriesList => "fetch_series_list",
            Action::FetchSeries(_) => "fetch_series",
            Action::CreateSeries(_) => "create_series",
            Action::OpenSeries(_) => "open_series",
            Action::FetchUser => "fetch_user",
        }
    }
}

/// Result of a successful action
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    Token(String),
    LoggedOut,
    Authenticated(bool),
    Config(ConfigSnapshot),
    SeriesList(Vec<Series>),
    Series(Series),
    User(User),
}

/// Copy of the whole state tree, keyed by module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RootState {
    pub auth: AuthState,
    pub config: ConfigState,
    pub series: SeriesState,
    pub user: UserState,
}

/// The process-wide state container
pub struct Store {
    http: Arc<HttpClient>,
    storage: Arc<dyn ClientStorage>,
    events: Arc<EventBus>,
    auth: AuthModule,
    config: ConfigModule,
    series: SeriesModule,
    user: UserModule,
}

impl Store {
    /// Build the HTTP client, API modules and store modules
    ///
    /// The recently viewed series list is loaded from `storage` here; the
    /// session is not restored until [`Action::CheckAuth`] runs.
    pub fn new(config: &StoreConfig, storage: Arc<dyn ClientStorage>) -> Result<Self, ApiError> {
        let http = Arc::new(HttpClient::new(config, storage.clone())?);
        let api = Api::new(http.clone());
        let events = Arc::new(EventBus::new(EVENT_CAPACITY));

        debug!(api_root = %config.api_root, "Creating store");

        Ok(Self {
            auth: AuthModule::new(api.auth, storage.clone(), events.clone()),
            config: ConfigModule::new(api.config, events.clone()),
            series: SeriesModule::new(
                api.series,
                storage.clone(),
                events.clone(),
                config.recent_capacity,
            ),
            user: UserModule::new(api.user, events.clone()),
            http,
            storage,
            events,
        })
    }

    pub fn auth(&self) -> &AuthModule {
        &self.auth
    }

    pub fn config(&self) -> &ConfigModule {
        &self.config
    }

    pub fn series(&self) -> &SeriesModule {
        &self.series
    }

    pub fn user(&self) -> &UserModule {
        &self.user
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn storage(&self) -> &Arc<dyn ClientStorage> {
        &self.storage
    }

    /// Receive a [`StoreEvent`] after every committed mutation
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Apply a mutation to its module
    pub async fn commit(&self, mutation: Mutation) {
        match mutation {
            Mutation::Auth(m) => self.auth.commit(m).await,
            Mutation::Config(m) => self.config.commit(m).await,
            Mutation::Series(m) => self.series.commit(m).await,
            Mutation::User(m) => self.user.commit(m).await,
        }
    }

    /// Run an action
    ///
    /// Any action rejected with 401 also ends the local session.
    pub async fn dispatch(&self, action: Action) -> Result<ActionOutcome, ApiError> {
        let module = action.module();
        let name = action.name();
        debug!(module = %module, action = name, "Dispatching action");

        let result = match action {
            Action::Login { username, password } => self
                .auth
                .login(&username, &password)
                .await
                .map(ActionOutcome::Token),
            Action::Logout => self.auth.logout().await.map(|()| ActionOutcome::LoggedOut),
            Action::CheckAuth => Ok(ActionOutcome::Authenticated(self.auth.check_auth().await)),
            Action::FetchConfig => self.config.fetch_config().await.map(ActionOutcome::Config),
            Action::FetchSeriesList => self
                .series
                .fetch_series_list()
                .await
                .map(ActionOutcome::SeriesList),
            Action::FetchSeries(id) => {
                self.series.fetch_series(id).await.map(ActionOutcome::Series)
            }
            Action::CreateSeries(new_series) => self
                .series
                .create_series(new_series)
                .await
                .map(ActionOutcome::Series),
            Action::OpenSeries(id) => {
                self.series.open_series(id).await.map(ActionOutcome::Series)
            }
            Action::FetchUser => self.user.fetch_user().await.map(ActionOutcome::User),
        };

        if let Err(e) = &result {
            warn!(module = %module, action = name, error = %e, "Action failed");
            if e.is_unauthorized() {
                self.auth.invalidate_session().await;
            }
        }

        result
    }

    /// Clone every state slice
    pub async fn snapshot(&self) -> RootState {
        RootState {
            auth: self.auth.state().await,
            config: self.config.state().await,
            series: self.series.state().await,
            user: self.user.state().await,
        }
    }
}
