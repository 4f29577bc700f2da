//! Command execution: every command is an action dispatched through the store

use crate::{Command, SeriesCommand, StatusFilter};
use anyhow::Result;
use mlib_client::store::{Action, Store};
use mlib_common::models::{NewSeries, Series};
use serde_json::{json, Value};
use tracing::warn;

pub(crate) async fn run(store: &Store, command: Command) -> Result<Value> {
    // Same as page start: restore the session from storage, no network call
    store.dispatch(Action::CheckAuth).await?;

    let output = match command {
        Command::Login { username, password } => {
            store
                .dispatch(Action::Login {
                    username: username.clone(),
                    password,
                })
                .await?;
            json!({ "authenticated": true, "username": username })
        }
        Command::Logout => {
            store.dispatch(Action::Logout).await?;
            json!({ "authenticated": false })
        }
        Command::Status => {
            let auth = store.auth().state().await;
            json!({ "authenticated": auth.is_authenticated })
        }
        Command::Series(command) => {
            if !store.auth().is_authenticated().await {
                warn!("No stored session, the server may reject this request");
            }
            run_series(store, command).await?
        }
        Command::Config => serde_json::to_value(store.dispatch(Action::FetchConfig).await?)?,
        Command::Whoami => serde_json::to_value(store.dispatch(Action::FetchUser).await?)?,
    };

    Ok(output)
}

async fn run_series(store: &Store, command: SeriesCommand) -> Result<Value> {
    let output = match command {
        SeriesCommand::List { status } => {
            store.dispatch(Action::FetchSeriesList).await?;
            let state = store.series().state().await;
            let series: Vec<&Series> = match status {
                StatusFilter::All => state.series.iter().collect(),
                StatusFilter::Active => state.series_active(),
                StatusFilter::Ended => state.series_ended(),
            };
            serde_json::to_value(series)?
        }
        SeriesCommand::Show { id } => {
            serde_json::to_value(store.dispatch(Action::OpenSeries(id)).await?)?
        }
        SeriesCommand::Add { title } => serde_json::to_value(
            store
                .dispatch(Action::CreateSeries(NewSeries {
                    title,
                    extra: Default::default(),
                }))
                .await?,
        )?,
        SeriesCommand::Recent => {
            let state = store.series().state().await;
            serde_json::to_value(state.recent.entries())?
        }
    };

    Ok(output)
}
