use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::archive::Attachment;
use crate::archive::SourcePost;
use crate::archive::SummaryNotice;
use crate::snowflake::Snowflake;

const BLURPLE: u32 = 0x5865_F2;

#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub id: Snowflake,
    pub username: String,
    pub global_name: Option<String>,
}

impl UserResponse {
    pub fn display_name(&self) -> &str {
        self.global_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberResponse {
    pub nick: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub id: Snowflake,
    pub timestamp: DateTime<Utc>,
    pub author: UserResponse,
    pub member: Option<MemberResponse>,
    #[serde(default)]
    pub attachments: Vec<AttachmentResponse>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentResponse {
    pub id: Snowflake,
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
}

impl From<MessageResponse> for SourcePost {
    fn from(message: MessageResponse) -> Self {
        let author = message
            .member
            .and_then(|member| member.nick)
            .filter(|nick| !nick.is_empty())
            .unwrap_or_else(|| message.author.display_name().to_owned());
        SourcePost {
            id: message.id,
            author,
            created_at: message.timestamp,
            attachments: message.attachments.into_iter().map(Attachment::from).collect(),
        }
    }
}

impl From<AttachmentResponse> for Attachment {
    fn from(attachment: AttachmentResponse) -> Self {
        Attachment {
            id: attachment.id,
            filename: attachment.filename,
            url: attachment.url,
            content_type: attachment.content_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChannelResponse {
    pub id: Snowflake,
    pub name: Option<String>,
    pub parent_id: Option<Snowflake>,
    pub thread_metadata: Option<ThreadMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadMetadata {
    pub archive_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ThreadListResponse {
    pub threads: Vec<ChannelResponse>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitResponse {
    pub retry_after: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateThreadRequest<'a> {
    pub name: &'a str,
    pub message: MessageRequest<'a>,
}

#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<EmbedRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRequest<'a>>,
    pub allowed_mentions: AllowedMentions,
}

impl<'a> MessageRequest<'a> {
    pub fn text(content: &'a str) -> Self {
        MessageRequest {
            content: Some(content),
            embeds: vec![],
            attachments: vec![],
            allowed_mentions: AllowedMentions::default(),
        }
    }
}

/// Empty `parse` keeps relayed text from pinging anyone.
#[derive(Debug, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AttachmentRequest<'a> {
    pub id: u32,
    pub filename: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EmbedRequest {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl From<&SummaryNotice> for EmbedRequest {
    fn from(notice: &SummaryNotice) -> Self {
        EmbedRequest {
            title: notice.title.clone(),
            description: notice.description.clone(),
            color: BLURPLE,
            fields: vec![
                EmbedField {
                    name: "Archive Forum Thread".to_owned(),
                    value: notice.thread_id.mention(),
                    inline: false,
                },
                EmbedField {
                    name: "Days Archived".to_owned(),
                    value: notice.days_archived.to_string(),
                    inline: true,
                },
            ],
            footer: EmbedFooter {
                text: format!("Generated by {}", notice.requested_by),
            },
        }
    }
}
