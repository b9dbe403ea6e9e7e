#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use config::AppConfig;
use discord::Discord;
use framework::exception::CoreRsResult;
use framework::log;
use framework::shutdown::Shutdown;
use framework::task;
use framework::web::server::HttpServerConfig;
use framework::web::server::start_http_server;
use tracing::info;

use crate::archive::lock::GuildLocks;
use crate::archive::pipeline::ArchiveSettings;

mod archive;
mod command;
mod config;
mod discord;
mod snowflake;
mod web;

pub struct AppState {
    config: AppConfig,
    settings: ArchiveSettings,
    discord: Discord,
    locks: GuildLocks,
    relay_secret: Option<String>,
}

impl AppState {
    fn new(config: AppConfig) -> CoreRsResult<Self> {
        let discord = Discord::new(
            &config.discord_api_uri,
            config.token()?,
            Duration::from_secs(config.http_timeout_secs),
        )?;
        Ok(AppState {
            settings: config.archive_settings(),
            relay_secret: config.relay_secret()?,
            discord,
            locks: GuildLocks::new(),
            config,
        })
    }
}

#[tokio::main]
async fn main() -> CoreRsResult<()> {
    log::init();

    let config = AppConfig::load()?;
    let bind_address = config.bind_address.clone();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    shutdown.listen();

    let state = Arc::new(AppState::new(config)?);
    let user = state.discord.current_user().await?;
    info!(user_id = %user.id, "logged in as {}", user.display_name());
    if state.relay_secret.is_none() {
        info!("relay secret not configured, accepting unauthenticated commands");
    }

    let app = Router::new();
    let app = app.merge(web::routes());
    let app = app.with_state(state);
    start_http_server(app, signal, HttpServerConfig { bind_address }).await?;

    task::shutdown().await;
    Ok(())
}
