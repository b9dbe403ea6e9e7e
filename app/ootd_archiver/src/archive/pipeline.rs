use std::time::Duration;

use chrono::Datelike;
use chrono::Utc;
use framework::exception;
use framework::exception::CoreRsResult;
use framework::exception::Exception;
use framework::validation_error;
use tokio::time;
use tracing::Instrument;
use tracing::info;
use tracing::info_span;
use tracing::warn;

use super::ArchiveRequest;
use super::ChannelDirectory;
use super::ChatPlatform;
use super::GuildChannels;
use super::error_code;
use super::fetch::fetch_month;
use super::lock::GuildLocks;
use super::period::ResolvedPeriod;
use super::publish::PublishTarget;
use super::publish::publish;
use super::sample::sample_daily;
use super::volume::resolve_volume;
use crate::snowflake::Snowflake;

pub struct ArchiveSettings {
    pub min_year: i32,
    pub max_volume: u32,
    pub run_timeout: Duration,
    pub usage: String,
}

#[derive(Debug)]
pub struct ArchiveOutcome {
    pub thread_id: Snowflake,
    pub label: String,
    pub days_sampled: usize,
    pub days_archived: usize,
}

/// Runs one invocation end to end and tells the invoker how it went.
pub async fn run_archive_command<P, D>(
    platform: &P,
    directory: &D,
    locks: &GuildLocks,
    settings: &ArchiveSettings,
    request: &ArchiveRequest,
) -> CoreRsResult<()>
where
    P: ChatPlatform,
    D: ChannelDirectory,
{
    match archive(platform, directory, locks, settings, request).await {
        Ok(outcome) => {
            info!(
                thread_id = %outcome.thread_id,
                label = outcome.label,
                days_sampled = outcome.days_sampled,
                days_archived = outcome.days_archived,
                "archive completed"
            );
            Ok(())
        }
        Err(e) => {
            let reply = reply_for(&e, settings);
            if let Err(send_error) = platform.send_message(request.channel_id, &reply).await {
                warn!(channel_id = %request.channel_id, "failed to reply to invoker, error={send_error}");
            }
            Err(e)
        }
    }
}

/// Serializes runs per server, the lock is released on every exit including timeout.
pub async fn archive<P, D>(
    platform: &P,
    directory: &D,
    locks: &GuildLocks,
    settings: &ArchiveSettings,
    request: &ArchiveRequest,
) -> CoreRsResult<ArchiveOutcome>
where
    P: ChatPlatform,
    D: ChannelDirectory,
{
    let guild_id = request.guild_id.ok_or_else(|| {
        validation_error!(
            code = error_code::NOT_IN_GUILD,
            message = "This command can only be used inside a server."
        )
    })?;
    let Some(lock) = locks.try_acquire(guild_id) else {
        return Err(validation_error!(
            code = error_code::LOCK_CONTENTION,
            message = "⚠️ Archive already running. Please wait."
        ));
    };

    let span = info_span!("archive", guild_id = %lock.guild_id(), user_id = %request.user_id);
    let run = archive_locked(platform, directory, settings, lock.guild_id(), request).instrument(span);
    match time::timeout(settings.run_timeout, run).await {
        Ok(result) => result,
        Err(elapsed) => Err(exception!(
            code = error_code::RUN_TIMED_OUT,
            message = format!(
                "❌ Archive did not finish within {}s and was stopped.",
                settings.run_timeout.as_secs()
            ),
            source = elapsed
        )),
    }
}

async fn archive_locked<P, D>(
    platform: &P,
    directory: &D,
    settings: &ArchiveSettings,
    guild_id: Snowflake,
    request: &ArchiveRequest,
) -> CoreRsResult<ArchiveOutcome>
where
    P: ChatPlatform,
    D: ChannelDirectory,
{
    let channels = directory.resolve_channels(guild_id).ok_or_else(|| {
        validation_error!(
            code = error_code::UNCONFIGURED_SERVER,
            message = "❌ This server has no archive channels configured."
        )
    })?;
    if request.channel_id != channels.command {
        return Err(validation_error!(
            code = error_code::WRONG_INVOCATION_CHANNEL,
            message = format!("This command can only be used in {}!", channels.command.mention())
        ));
    }
    let period = ResolvedPeriod::parse(&request.month, &request.year, settings.min_year, Utc::now().year())?;
    verify_bindings(platform, &channels).await?;

    platform
        .send_message(
            request.channel_id,
            &format!(
                "✅ Archiving daily random OOTD posts from {}/{}...",
                period.month.number(),
                period.year
            ),
        )
        .await?;

    let posts = fetch_month(platform, channels.source, &period).await?;
    if posts.is_empty() {
        return Err(validation_error!(
            code = error_code::NO_QUALIFYING_MESSAGES,
            message = "No messages found for that month/year."
        ));
    }
    let samples = sample_daily(posts);

    let titles = platform.thread_titles(guild_id, channels.forum).await?;
    let volume = resolve_volume(&period.base_label(), &titles, settings.max_volume)?;

    let target = PublishTarget {
        forum_id: channels.forum,
        announcement_id: channels.announcement,
        requested_by: request.user_display_name.clone(),
    };
    let report = publish(platform, &target, &volume, &samples).await?;

    let outcome = ArchiveOutcome {
        thread_id: report.thread_id,
        label: report.label.clone(),
        days_sampled: samples.len(),
        days_archived: report.days_archived(),
    };
    let confirmation = format!(
        "📁 Created {} with {} of {} day(s) archived.",
        outcome.thread_id.mention(),
        outcome.days_archived,
        outcome.days_sampled
    );
    if let Err(e) = platform.send_message(request.channel_id, &confirmation).await {
        warn!("failed to send confirmation, error={e}");
    }
    Ok(outcome)
}

async fn verify_bindings<P>(platform: &P, channels: &GuildChannels) -> CoreRsResult<()>
where
    P: ChatPlatform,
{
    let bound = [Some(channels.source), Some(channels.forum), channels.announcement];
    for channel_id in bound.into_iter().flatten() {
        if !platform.channel_exists(channel_id).await? {
            warn!(%channel_id, "configured channel does not resolve");
            return Err(validation_error!(
                code = error_code::MISSING_CHANNEL_BINDING,
                message = "❌ One or more channels not found."
            ));
        }
    }
    Ok(())
}

/// Rejections and timeouts are explained to the invoker, transport failures stay in the log.
fn reply_for(e: &Exception, settings: &ArchiveSettings) -> String {
    if e.has_code(error_code::INVALID_MONTH) || e.has_code(error_code::INVALID_YEAR) {
        format!("{}\n{}", e.message, settings.usage)
    } else if e.is_rejection() || e.has_code(error_code::RUN_TIMED_OUT) {
        e.message.clone()
    } else {
        "❌ Archive failed unexpectedly, please try again later.".to_owned()
    }
}
