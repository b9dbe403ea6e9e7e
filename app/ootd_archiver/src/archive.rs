use std::future::Future;

use chrono::DateTime;
use chrono::Utc;
use framework::exception::CoreRsResult;
use serde::Deserialize;

pub use sample::DailySample;

use crate::snowflake::Snowflake;

pub mod error_code;
#[cfg(test)]
pub(crate) mod fake;
pub mod fetch;
pub mod lock;
pub mod period;
pub mod pipeline;
pub mod publish;
pub mod sample;
pub mod volume;

/// One `archive` invocation as received from the command relay.
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub guild_id: Option<Snowflake>,
    pub channel_id: Snowflake,
    pub user_id: Snowflake,
    pub user_display_name: String,
    pub month: String,
    pub year: String,
    // accepted for compatibility, not used yet
    pub reaction: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourcePost {
    pub id: Snowflake,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
}

/// Channels bound to one server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildChannels {
    pub command: Snowflake,
    pub source: Snowflake,
    pub forum: Snowflake,
    pub announcement: Option<Snowflake>,
}

/// Structured summary posted to the announcement channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryNotice {
    pub title: String,
    pub description: String,
    pub thread_id: Snowflake,
    pub days_archived: usize,
    pub requested_by: String,
}

pub trait ChannelDirectory: Send + Sync {
    fn resolve_channels(&self, guild_id: Snowflake) -> Option<GuildChannels>;
}

/// Operations the pipeline needs from the chat platform.
pub trait ChatPlatform: Send + Sync {
    fn channel_exists(&self, channel_id: Snowflake) -> impl Future<Output = CoreRsResult<bool>> + Send;

    /// Oldest first, at most `limit` posts with id greater than `after`.
    fn messages_after(
        &self,
        channel_id: Snowflake,
        after: Snowflake,
        limit: u16,
    ) -> impl Future<Output = CoreRsResult<Vec<SourcePost>>> + Send;

    /// Titles of active and archived threads under `forum_id`.
    fn thread_titles(
        &self,
        guild_id: Snowflake,
        forum_id: Snowflake,
    ) -> impl Future<Output = CoreRsResult<Vec<String>>> + Send;

    fn create_thread(
        &self,
        forum_id: Snowflake,
        name: &str,
        content: &str,
    ) -> impl Future<Output = CoreRsResult<Snowflake>> + Send;

    fn send_message(&self, channel_id: Snowflake, content: &str) -> impl Future<Output = CoreRsResult<()>> + Send;

    fn send_notice(
        &self,
        channel_id: Snowflake,
        notice: &SummaryNotice,
    ) -> impl Future<Output = CoreRsResult<()>> + Send;

    fn repost_attachment(
        &self,
        channel_id: Snowflake,
        caption: &str,
        attachment: &Attachment,
    ) -> impl Future<Output = CoreRsResult<()>> + Send;
}
