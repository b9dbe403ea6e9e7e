use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use chrono::DateTime;
use chrono::Utc;
use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::error_code::UPSTREAM_ERROR;

use super::Attachment;
use super::ChatPlatform;
use super::GuildChannels;
use super::SourcePost;
use super::SummaryNotice;
use crate::snowflake::Snowflake;

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// Post with `attachments` images, ids derived from `created_at` like real snowflakes.
pub(crate) fn post_at(created_at: DateTime<Utc>, attachments: usize) -> SourcePost {
    let base = Snowflake::from_timestamp(created_at).0;
    let id = Snowflake(base + (SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0x3f_ffff));
    SourcePost {
        id,
        author: "Ana".to_owned(),
        created_at,
        attachments: (0..attachments)
            .map(|index| Attachment {
                id: Snowflake(SEQUENCE.fetch_add(1, Ordering::Relaxed)),
                filename: format!("outfit_{index}.jpg"),
                url: format!("https://cdn.discordapp.test/{id}/outfit_{index}.jpg"),
                content_type: Some("image/jpeg".to_owned()),
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Call {
    ChannelExists(Snowflake),
    History { after: Snowflake },
    ThreadTitles,
    CreateThread { forum: Snowflake, name: String, content: String },
    Message { channel: Snowflake, content: String },
    Notice { channel: Snowflake, notice: SummaryNotice },
    Repost { channel: Snowflake, caption: String, attachment: Snowflake },
}

#[derive(Default)]
struct State {
    posts: Vec<SourcePost>,
    titles: Vec<String>,
    missing_channels: HashSet<Snowflake>,
    failing_attachments: HashSet<Snowflake>,
    fail_thread_titles: bool,
    stall_history: bool,
    calls: Vec<Call>,
    next_thread: u64,
}

/// In-memory chat platform recording every call.
pub(crate) struct FakePlatform {
    pub guild: Snowflake,
    pub command: Snowflake,
    pub source: Snowflake,
    pub forum: Snowflake,
    pub announcement: Snowflake,
    state: Mutex<State>,
}

impl FakePlatform {
    pub(crate) fn new() -> Self {
        FakePlatform {
            guild: Snowflake(100),
            command: Snowflake(101),
            source: Snowflake(102),
            forum: Snowflake(103),
            announcement: Snowflake(104),
            state: Mutex::new(State {
                next_thread: 900,
                ..State::default()
            }),
        }
    }

    pub(crate) fn channels(&self) -> GuildChannels {
        GuildChannels {
            command: self.command,
            source: self.source,
            forum: self.forum,
            announcement: Some(self.announcement),
        }
    }

    pub(crate) fn add_post(&self, post: SourcePost) {
        let mut state = self.state();
        state.posts.push(post);
        state.posts.sort_by_key(|post| post.id);
    }

    pub(crate) fn add_title(&self, title: &str) {
        self.state().titles.push(title.to_owned());
    }

    pub(crate) fn remove_channel(&self, channel: Snowflake) {
        self.state().missing_channels.insert(channel);
    }

    pub(crate) fn fail_attachment(&self, attachment: Snowflake) {
        self.state().failing_attachments.insert(attachment);
    }

    pub(crate) fn fail_thread_titles(&self) {
        self.state().fail_thread_titles = true;
    }

    /// History requests never complete, like a hung connection.
    pub(crate) fn stall_history(&self) {
        self.state().stall_history = true;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub(crate) fn history_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::History { .. }))
            .count()
    }

    pub(crate) fn created_threads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateThread { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn messages(&self, channel: Snowflake) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Message { channel: target, content } if target == channel => Some(content),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn notices(&self) -> Vec<SummaryNotice> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Notice { notice, .. } => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn reposts(&self) -> Vec<(Snowflake, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Repost { channel, caption, .. } => Some((channel, caption)),
                _ => None,
            })
            .collect()
    }

    /// True once anything beyond replying to the invoker happened.
    pub(crate) fn touched_archive(&self) -> bool {
        self.calls().iter().any(|call| {
            matches!(
                call,
                Call::History { .. } | Call::ThreadTitles | Call::CreateThread { .. } | Call::Repost { .. } | Call::Notice { .. }
            )
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

impl ChatPlatform for FakePlatform {
    async fn channel_exists(&self, channel_id: Snowflake) -> CoreRsResult<bool> {
        self.record(Call::ChannelExists(channel_id));
        Ok(!self.state().missing_channels.contains(&channel_id))
    }

    async fn messages_after(&self, channel_id: Snowflake, after: Snowflake, limit: u16) -> CoreRsResult<Vec<SourcePost>> {
        self.record(Call::History { after });
        let stalled = self.state().stall_history;
        if stalled {
            std::future::pending::<()>().await;
        }
        if channel_id != self.source {
            return Ok(Vec::new());
        }
        Ok(self
            .state()
            .posts
            .iter()
            .filter(|post| post.id > after)
            .take(usize::from(limit))
            .cloned()
            .collect())
    }

    async fn thread_titles(&self, _guild_id: Snowflake, _forum_id: Snowflake) -> CoreRsResult<Vec<String>> {
        self.record(Call::ThreadTitles);
        let state = self.state();
        if state.fail_thread_titles {
            return Err(exception!(
                code = UPSTREAM_ERROR,
                message = r#"failed to list active threads, status=500, body={"message": "internal"}"#
            ));
        }
        Ok(state.titles.clone())
    }

    async fn create_thread(&self, forum_id: Snowflake, name: &str, content: &str) -> CoreRsResult<Snowflake> {
        self.record(Call::CreateThread {
            forum: forum_id,
            name: name.to_owned(),
            content: content.to_owned(),
        });
        let mut state = self.state();
        state.titles.push(name.to_owned());
        state.next_thread += 1;
        Ok(Snowflake(state.next_thread))
    }

    async fn send_message(&self, channel_id: Snowflake, content: &str) -> CoreRsResult<()> {
        self.record(Call::Message {
            channel: channel_id,
            content: content.to_owned(),
        });
        Ok(())
    }

    async fn send_notice(&self, channel_id: Snowflake, notice: &SummaryNotice) -> CoreRsResult<()> {
        self.record(Call::Notice {
            channel: channel_id,
            notice: notice.clone(),
        });
        Ok(())
    }

    async fn repost_attachment(&self, channel_id: Snowflake, caption: &str, attachment: &Attachment) -> CoreRsResult<()> {
        if self.state().failing_attachments.contains(&attachment.id) {
            return Err(exception!(message = format!("failed to download attachment, id={}", attachment.id)));
        }
        self.record(Call::Repost {
            channel: channel_id,
            caption: caption.to_owned(),
            attachment: attachment.id,
        });
        Ok(())
    }
}
