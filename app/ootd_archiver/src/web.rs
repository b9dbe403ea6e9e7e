use std::sync::Arc;

use axum::Router;
use axum::debug_handler;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::routing::post;
use framework::exception::CoreRsResult;
use framework::exception::error_code;
use framework::task;
use framework::validate::Validator;
use framework::validate::require;
use framework::validation_error;
use framework::web::body::Json;
use framework::web::error::HttpResult;
use serde::Deserialize;
use tracing::debug;
use tracing::info;

use crate::AppState;
use crate::archive::ArchiveRequest;
use crate::archive::ChatPlatform;
use crate::archive::pipeline::run_archive_command;
use crate::command;
use crate::command::Command;
use crate::snowflake::Snowflake;

const RELAY_SECRET_HEADER: &str = "x-relay-secret";
const MAX_CONTENT_LENGTH: usize = 4000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/command", post(command_post))
}

/// Chat message forwarded by the gateway relay.
#[derive(Debug, Deserialize)]
struct CommandRequest {
    guild_id: Option<Snowflake>,
    channel_id: Snowflake,
    author: CommandAuthor,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CommandAuthor {
    id: Snowflake,
    display_name: String,
    #[serde(default)]
    bot: bool,
}

impl Validator for CommandRequest {
    fn validate(&self) -> CoreRsResult<()> {
        require(
            self.content.len() <= MAX_CONTENT_LENGTH,
            format!("content must not exceed {MAX_CONTENT_LENGTH} bytes"),
        )?;
        require(!self.author.display_name.trim().is_empty(), "author.display_name must not be empty")
    }
}

impl CommandRequest {
    fn into_archive_request(self, month: String, year: String, reaction: Option<String>) -> ArchiveRequest {
        ArchiveRequest {
            guild_id: self.guild_id,
            channel_id: self.channel_id,
            user_id: self.author.id,
            user_display_name: self.author.display_name,
            month,
            year,
            reaction,
        }
    }
}

#[debug_handler]
async fn command_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CommandRequest>,
) -> HttpResult<StatusCode> {
    verify_relay_secret(state.relay_secret.as_deref(), &headers)?;
    if request.author.bot {
        return Ok(StatusCode::NO_CONTENT);
    }

    let parsed = command::parse(&state.config.command_prefix, &request.content);
    match parsed {
        Command::Ignored => Ok(StatusCode::NO_CONTENT),
        Command::Usage => {
            let channel_id = request.channel_id;
            debug!(%channel_id, "archive invoked without arguments");
            task::spawn_action("archive_usage", async move {
                state.discord.send_message(channel_id, &state.settings.usage).await
            });
            Ok(StatusCode::ACCEPTED)
        }
        Command::Archive { month, year, reaction } => {
            let request = request.into_archive_request(month, year, reaction);
            info!(
                guild_id = ?request.guild_id,
                user_id = %request.user_id,
                month = request.month,
                year = request.year,
                reaction = ?request.reaction,
                "archive requested"
            );
            task::spawn_action("archive", async move {
                run_archive_command(
                    &state.discord,
                    &state.config.guilds,
                    &state.locks,
                    &state.settings,
                    &request,
                )
                .await
            });
            Ok(StatusCode::ACCEPTED)
        }
    }
}

fn verify_relay_secret(expected: Option<&str>, headers: &HeaderMap) -> CoreRsResult<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let provided = headers.get(RELAY_SECRET_HEADER).and_then(|value| value.to_str().ok());
    if provided == Some(expected) {
        Ok(())
    } else {
        Err(validation_error!(code = error_code::FORBIDDEN, message = "access denied"))
    }
}
