mod config;
mod db;
mod entities;
mod error;
mod mapper;
mod models;
mod routes;
mod services;
mod storage;
mod validation;

use std::sync::Arc;

use crate::{
    config::{Config, FriendshipMode, StorageBackend},
    services::{FilmService, ReferenceService, UserService},
    storage::Storage,
};

#[derive(Clone)]
pub struct AppState {
    pub films: FilmService,
    pub users: UserService,
    pub reference: ReferenceService,
}

impl AppState {
    pub fn new(storage: Storage, friendship: FriendshipMode) -> Self {
        Self {
            films: FilmService::new(storage.clone()),
            users: UserService::new(storage.clone(), friendship),
            reference: ReferenceService::new(storage),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,filmrate=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Config::from_env()?;

    let storage = match config.storage {
        StorageBackend::Memory => Storage::memory(),
        StorageBackend::Database => {
            let db =
                db::connect_and_migrate(&config.database_url, config.database_max_connections)
                    .await?;
            Storage::database(db)
        },
    };
    tracing::info!(
        storage = storage.kind(),
        friendship = ?config.friendship_mode,
        "storage initialised"
    );

    let state = Arc::new(AppState::new(storage, config.friendship_mode));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
