use std::time::Duration;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::error_code::UPSTREAM_ERROR;
use framework::http::HttpClient;
use framework::http::HttpMethod;
use framework::http::HttpMethod::GET;
use framework::http::HttpMethod::POST;
use framework::http::HttpRequest;
use framework::http::HttpResponse;
use framework::http::header;
use framework::http::multipart;
use framework::json;
use serde::de::DeserializeOwned;
use tokio::time;
use tracing::debug;
use tracing::warn;

use crate::archive::Attachment;
use crate::archive::ChatPlatform;
use crate::archive::SourcePost;
use crate::archive::SummaryNotice;
use crate::discord::model::AllowedMentions;
use crate::discord::model::AttachmentRequest;
use crate::discord::model::ChannelResponse;
use crate::discord::model::CreateThreadRequest;
use crate::discord::model::EmbedRequest;
use crate::discord::model::MessageRequest;
use crate::discord::model::MessageResponse;
use crate::discord::model::RateLimitResponse;
use crate::discord::model::ThreadListResponse;
use crate::discord::model::UserResponse;
use crate::snowflake::Snowflake;

pub mod model;

const MAX_ATTEMPTS: u32 = 3;
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);
const ARCHIVED_THREADS_PAGE: u16 = 100;
const USER_AGENT: &str = concat!("DiscordBot (ootd_archiver, ", env!("CARGO_PKG_VERSION"), ")");

/// Discord REST API, authenticated as the bot.
pub struct Discord {
    uri: String,
    token: String,
    client: HttpClient,
}

enum Payload<'a> {
    Empty,
    Json(String),
    File {
        payload_json: String,
        filename: &'a str,
        content_type: Option<&'a str>,
        data: &'a [u8],
    },
}

impl Discord {
    pub fn new(uri: &str, token: String, timeout: Duration) -> CoreRsResult<Self> {
        Ok(Self {
            uri: uri.trim_end_matches('/').to_owned(),
            token,
            client: HttpClient::new(timeout)?,
        })
    }

    pub async fn current_user(&self) -> CoreRsResult<UserResponse> {
        let response = self.call(GET, "/users/@me", Payload::Empty).await?;
        parse(&success(response, "get current user")?)
    }

    /// Sends the request, waiting out rate limits up to `MAX_ATTEMPTS` times.
    async fn call(&self, method: HttpMethod, path: &str, payload: Payload<'_>) -> CoreRsResult<HttpResponse> {
        let uri = &self.uri;
        let mut attempt = 1;
        loop {
            let mut request = HttpRequest::new(method, format!("{uri}{path}"));
            request.header(header::AUTHORIZATION, format!("Bot {}", self.token));
            request.header(header::USER_AGENT, USER_AGENT);
            match &payload {
                Payload::Empty => {}
                Payload::Json(body) => request.body(body.clone(), "application/json"),
                Payload::File {
                    payload_json,
                    filename,
                    content_type,
                    data,
                } => {
                    let mut part = multipart::Part::bytes(data.to_vec()).file_name((*filename).to_owned());
                    if let Some(content_type) = content_type {
                        part = part.mime_str(content_type)?;
                    }
                    let form = multipart::Form::new()
                        .text("payload_json", payload_json.clone())
                        .part("files[0]", part);
                    request.multipart(form);
                }
            }

            let response = self.client.execute(request).await?;
            if response.status != 429 || attempt >= MAX_ATTEMPTS {
                return Ok(response);
            }
            let delay = retry_after(&response);
            warn!(%method, path, attempt, "rate limited, retry_after={delay:?}");
            time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn download(&self, attachment: &Attachment) -> CoreRsResult<HttpResponse> {
        let request = HttpRequest::new(GET, attachment.url.clone());
        let response = self.client.execute(request).await?;
        success(response, &format!("download attachment, id={}", attachment.id))
    }

    async fn post_message(&self, channel_id: Snowflake, message: &MessageRequest<'_>) -> CoreRsResult<()> {
        let body = json::to_json(message)?;
        let response = self
            .call(POST, &format!("/channels/{channel_id}/messages"), Payload::Json(body))
            .await?;
        success(response, &format!("send message, channel={channel_id}"))?;
        Ok(())
    }

    async fn archived_thread_titles(&self, forum_id: Snowflake, titles: &mut Vec<String>) -> CoreRsResult<()> {
        let mut before = None;
        loop {
            let path = match before {
                Some(before) => format!(
                    "/channels/{forum_id}/threads/archived/public?limit={ARCHIVED_THREADS_PAGE}&before={}",
                    json_timestamp(before)
                ),
                None => format!("/channels/{forum_id}/threads/archived/public?limit={ARCHIVED_THREADS_PAGE}"),
            };
            let response = self.call(GET, &path, Payload::Empty).await?;
            let list: ThreadListResponse = parse(&success(response, "list archived threads")?)?;

            before = list
                .threads
                .last()
                .and_then(|thread| thread.thread_metadata.as_ref())
                .and_then(|metadata| metadata.archive_timestamp);
            titles.extend(list.threads.into_iter().filter_map(|thread| thread.name));
            if !list.has_more || before.is_none() {
                return Ok(());
            }
        }
    }
}

impl ChatPlatform for Discord {
    async fn channel_exists(&self, channel_id: Snowflake) -> CoreRsResult<bool> {
        let response = self.call(GET, &format!("/channels/{channel_id}"), Payload::Empty).await?;
        match response.status {
            200 => Ok(true),
            403 | 404 => {
                debug!(%channel_id, status = response.status, "channel not visible");
                Ok(false)
            }
            _ => Err(failure(&response, &format!("get channel, channel={channel_id}"))),
        }
    }

    async fn messages_after(&self, channel_id: Snowflake, after: Snowflake, limit: u16) -> CoreRsResult<Vec<SourcePost>> {
        let path = format!("/channels/{channel_id}/messages?after={after}&limit={limit}");
        let response = self.call(GET, &path, Payload::Empty).await?;
        let messages: Vec<MessageResponse> =
            parse(&success(response, &format!("get messages, channel={channel_id}"))?)?;
        let mut posts: Vec<SourcePost> = messages.into_iter().map(SourcePost::from).collect();
        posts.sort_by_key(|post| post.id);
        Ok(posts)
    }

    async fn thread_titles(&self, guild_id: Snowflake, forum_id: Snowflake) -> CoreRsResult<Vec<String>> {
        let response = self
            .call(GET, &format!("/guilds/{guild_id}/threads/active"), Payload::Empty)
            .await?;
        let active: ThreadListResponse = parse(&success(response, "list active threads")?)?;
        let mut titles: Vec<String> = active
            .threads
            .into_iter()
            .filter(|thread| thread.parent_id == Some(forum_id))
            .filter_map(|thread| thread.name)
            .collect();
        self.archived_thread_titles(forum_id, &mut titles).await?;
        debug!(%forum_id, count = titles.len(), "listed thread titles");
        Ok(titles)
    }

    async fn create_thread(&self, forum_id: Snowflake, name: &str, content: &str) -> CoreRsResult<Snowflake> {
        let request = CreateThreadRequest {
            name,
            message: MessageRequest::text(content),
        };
        let body = json::to_json(&request)?;
        let response = self
            .call(POST, &format!("/channels/{forum_id}/threads"), Payload::Json(body))
            .await?;
        let thread: ChannelResponse = parse(&success(response, &format!("create thread, name={name}"))?)?;
        Ok(thread.id)
    }

    async fn send_message(&self, channel_id: Snowflake, content: &str) -> CoreRsResult<()> {
        self.post_message(channel_id, &MessageRequest::text(content)).await
    }

    async fn send_notice(&self, channel_id: Snowflake, notice: &SummaryNotice) -> CoreRsResult<()> {
        let message = MessageRequest {
            content: None,
            embeds: vec![EmbedRequest::from(notice)],
            attachments: vec![],
            allowed_mentions: AllowedMentions::default(),
        };
        self.post_message(channel_id, &message).await
    }

    async fn repost_attachment(&self, channel_id: Snowflake, caption: &str, attachment: &Attachment) -> CoreRsResult<()> {
        let file = self.download(attachment).await?;
        let message = MessageRequest {
            content: Some(caption),
            embeds: vec![],
            attachments: vec![AttachmentRequest {
                id: 0,
                filename: &attachment.filename,
            }],
            allowed_mentions: AllowedMentions::default(),
        };
        let payload = Payload::File {
            payload_json: json::to_json(&message)?,
            filename: &attachment.filename,
            content_type: attachment.content_type.as_deref(),
            data: &file.body,
        };
        let response = self
            .call(POST, &format!("/channels/{channel_id}/messages"), payload)
            .await?;
        success(response, &format!("repost attachment, id={}", attachment.id))?;
        Ok(())
    }
}

fn success(response: HttpResponse, action: &str) -> CoreRsResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(failure(&response, action))
    }
}

fn failure(response: &HttpResponse, action: &str) -> exception::Exception {
    exception!(
        code = UPSTREAM_ERROR,
        message = format!(
            "failed to {action}, status={}, body={}",
            response.status,
            String::from_utf8_lossy(&response.body)
        )
    )
}

fn parse<T>(response: &HttpResponse) -> CoreRsResult<T>
where
    T: DeserializeOwned,
{
    json::from_json(response.text()?)
}

fn retry_after(response: &HttpResponse) -> Duration {
    let seconds = response
        .text()
        .ok()
        .and_then(|body| json::from_json::<RateLimitResponse>(body).ok())
        .map(|limit| limit.retry_after)
        .or_else(|| {
            response
                .headers
                .get(&header::RETRY_AFTER)
                .and_then(|value| value.parse::<f64>().ok())
        })
        .unwrap_or(1.0);
    Duration::try_from_secs_f64(seconds).map_or(Duration::from_secs(1), |delay| delay.min(MAX_RETRY_AFTER))
}

fn json_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use chrono::TimeZone;
    use chrono::Utc;
    use framework::exception::error_code::UPSTREAM_ERROR;
    use framework::http::HttpResponse;
    use framework::http::header;

    fn response(status: u16, body: &'static str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: body.as_bytes().to_vec().into(),
        }
    }

    #[test]
    fn retry_after() {
        let limited = response(429, r#"{"message": "You are being rate limited.", "retry_after": 0.25, "global": false}"#);
        assert_eq!(super::retry_after(&limited), Duration::from_millis(250));

        let mut limited = response(429, "slow down");
        limited.headers.insert(header::RETRY_AFTER, "2".to_owned());
        assert_eq!(super::retry_after(&limited), Duration::from_secs(2));

        assert_eq!(super::retry_after(&response(429, "")), Duration::from_secs(1));
        assert_eq!(
            super::retry_after(&response(429, r#"{"retry_after": 3600}"#)),
            Duration::from_secs(60)
        );
        assert_eq!(
            super::retry_after(&response(429, r#"{"retry_after": -1}"#)),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn success() {
        assert!(super::success(response(204, ""), "send message").is_ok());

        let error = super::success(response(403, r#"{"code": 50013}"#), "create thread, name=x")
            .err()
            .unwrap();
        assert!(error.has_code(UPSTREAM_ERROR));
        assert_eq!(error.message, r#"failed to create thread, name=x, status=403, body={"code": 50013}"#);
    }

    #[test]
    fn json_timestamp() {
        let time = Utc.with_ymd_and_hms(2025, 3, 2, 10, 0, 0).unwrap();
        assert_eq!(super::json_timestamp(time), "2025-03-02T10:00:00.000Z");
    }
}
