use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use framework::exception;
use framework::exception::CoreRsResult;
use framework::json;
use framework::validate::Validator;
use framework::validate::require;
use serde::Deserialize;
use tracing::info;

use crate::archive::ChannelDirectory;
use crate::archive::GuildChannels;
use crate::archive::pipeline::ArchiveSettings;
use crate::command;
use crate::snowflake::Snowflake;

const CONF_PATH_ENV: &str = "OOTD_ARCHIVER_CONF";
const DEFAULT_CONF_PATH: &str = "assets/conf.json";

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_discord_api_uri")]
    pub discord_api_uri: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    pub relay_secret_env: Option<String>,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    #[serde(default = "default_min_year")]
    pub min_year: i32,
    #[serde(default = "default_max_volume")]
    pub max_volume: u32,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    pub guilds: GuildDirectory,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_owned()
}

fn default_discord_api_uri() -> String {
    "https://discord.com/api/v10".to_owned()
}

fn default_token_env() -> String {
    "OOTD_BOT_TOKEN".to_owned()
}

fn default_command_prefix() -> String {
    "!".to_owned()
}

fn default_min_year() -> i32 {
    2023
}

fn default_max_volume() -> u32 {
    3
}

fn default_run_timeout_secs() -> u64 {
    900
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn load() -> CoreRsResult<Self> {
        let path = env::var(CONF_PATH_ENV).map_or_else(|_| PathBuf::from(DEFAULT_CONF_PATH), PathBuf::from);
        info!("load config, path={}", path.to_string_lossy());
        json::load_file(&path)
    }

    pub fn token(&self) -> CoreRsResult<String> {
        read_secret(&self.token_env)
    }

    pub fn relay_secret(&self) -> CoreRsResult<Option<String>> {
        self.relay_secret_env.as_deref().map(read_secret).transpose()
    }

    pub fn archive_settings(&self) -> ArchiveSettings {
        ArchiveSettings {
            min_year: self.min_year,
            max_volume: self.max_volume,
            run_timeout: Duration::from_secs(self.run_timeout_secs),
            usage: command::usage(&self.command_prefix),
        }
    }
}

fn read_secret(name: &str) -> CoreRsResult<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(exception!(message = format!("{name} not set in environment"))),
    }
}

impl Validator for AppConfig {
    fn validate(&self) -> CoreRsResult<()> {
        require(!self.command_prefix.trim().is_empty(), "command_prefix must not be empty")?;
        require(self.max_volume > 0, "max_volume must be positive")?;
        require(self.run_timeout_secs > 0, "run_timeout_secs must be positive")?;
        require(self.http_timeout_secs > 0, "http_timeout_secs must be positive")?;
        require(self.min_year > 0, "min_year must be positive")?;
        for (guild_id, channels) in &self.guilds.guilds {
            require(
                channels.source != channels.forum,
                format!("source and forum channel must differ, guild={guild_id}"),
            )?;
        }
        Ok(())
    }
}

/// Channel bindings per server, as configured.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct GuildDirectory {
    guilds: HashMap<Snowflake, GuildChannels>,
}

impl ChannelDirectory for GuildDirectory {
    fn resolve_channels(&self, guild_id: Snowflake) -> Option<GuildChannels> {
        self.guilds.get(&guild_id).cloned()
    }
}

impl FromIterator<(Snowflake, GuildChannels)> for GuildDirectory {
    fn from_iter<T: IntoIterator<Item = (Snowflake, GuildChannels)>>(iter: T) -> Self {
        GuildDirectory {
            guilds: iter.into_iter().collect(),
        }
    }
}
