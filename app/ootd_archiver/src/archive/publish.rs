use framework::exception::CoreRsResult;
use tracing::Instrument;
use tracing::debug;
use tracing::info;
use tracing::info_span;
use tracing::warn;

use super::ChatPlatform;
use super::DailySample;
use super::SourcePost;
use super::SummaryNotice;
use super::error_code;
use super::volume::ArchiveVolume;
use crate::snowflake::Snowflake;

const UNKNOWN_AUTHOR: &str = "Unknown User";

pub struct PublishTarget {
    pub forum_id: Snowflake,
    pub announcement_id: Option<Snowflake>,
    pub requested_by: String,
}

#[derive(Debug)]
pub struct PublishReport {
    pub thread_id: Snowflake,
    pub label: String,
    pub days: Vec<DayOutcome>,
}

#[derive(Debug)]
pub struct DayOutcome {
    pub day: u32,
    pub post_id: Snowflake,
    pub transfers: Vec<Transfer>,
}

#[derive(Debug)]
pub struct Transfer {
    pub filename: String,
    pub result: TransferResult,
}

#[derive(Debug, PartialEq, Eq)]
pub enum TransferResult {
    Delivered,
    Failed { reason: String },
}

impl PublishReport {
    pub fn days_archived(&self) -> usize {
        self.days.iter().filter(|day| day.is_archived()).count()
    }

    pub fn failed_transfers(&self) -> usize {
        self.days
            .iter()
            .flat_map(|day| &day.transfers)
            .filter(|transfer| transfer.result != TransferResult::Delivered)
            .count()
    }
}

impl DayOutcome {
    /// A day counts once any of its attachments made it into the thread.
    pub fn is_archived(&self) -> bool {
        self.transfers
            .iter()
            .any(|transfer| transfer.result == TransferResult::Delivered)
    }
}

/// Creates the volume thread and reposts every sample into it.
///
/// Attachment failures are recorded in the report and never abort the run.
pub async fn publish<P>(
    platform: &P,
    target: &PublishTarget,
    volume: &ArchiveVolume,
    samples: &[DailySample],
) -> CoreRsResult<PublishReport>
where
    P: ChatPlatform,
{
    let label = volume.label();
    let span = info_span!("publish", label = %label);
    async {
        let thread_id = platform
            .create_thread(target.forum_id, &label, &format!("Random OOTD images for {label}"))
            .await?;
        info!(%thread_id, "created archive thread");

        let mut days = Vec::with_capacity(samples.len());
        for sample in samples {
            days.push(repost_day(platform, thread_id, sample).await);
        }

        let report = PublishReport { thread_id, label, days };
        for day in &report.days {
            for transfer in &day.transfers {
                if let TransferResult::Failed { reason } = &transfer.result {
                    debug!(day = day.day, post_id = %day.post_id, filename = transfer.filename, reason, "missing from archive");
                }
            }
        }
        info!(
            days_archived = report.days_archived(),
            failed_transfers = report.failed_transfers(),
            "published samples"
        );

        if let Some(announcement_id) = target.announcement_id {
            let notice = SummaryNotice {
                title: format!("{} OOTD Archive", volume.base_label),
                description: "One random OOTD from each day has been archived.".to_owned(),
                thread_id,
                days_archived: report.days_archived(),
                requested_by: target.requested_by.clone(),
            };
            if let Err(e) = platform.send_notice(announcement_id, &notice).await {
                warn!(%announcement_id, "failed to send summary notice, error={e}");
            }
        }
        Ok(report)
    }
    .instrument(span)
    .await
}

async fn repost_day<P>(platform: &P, thread_id: Snowflake, sample: &DailySample) -> DayOutcome
where
    P: ChatPlatform,
{
    let post = &sample.post;
    let caption = caption(post);
    let mut transfers = Vec::with_capacity(post.attachments.len());
    for attachment in &post.attachments {
        let result = match platform.repost_attachment(thread_id, &caption, attachment).await {
            Ok(()) => TransferResult::Delivered,
            Err(e) => {
                warn!(
                    error_code = error_code::ATTACHMENT_TRANSFER_FAILURE,
                    post_id = %post.id,
                    filename = attachment.filename,
                    "failed to repost attachment, error={e}"
                );
                TransferResult::Failed { reason: e.message }
            }
        };
        transfers.push(Transfer {
            filename: attachment.filename.clone(),
            result,
        });
    }
    DayOutcome {
        day: sample.day,
        post_id: post.id,
        transfers,
    }
}

/// "Feb 03 by Ana"
fn caption(post: &SourcePost) -> String {
    let author = if post.author.trim().is_empty() {
        UNKNOWN_AUTHOR
    } else {
        post.author.as_str()
    };
    format!("{} by {author}", post.created_at.format("%b %d"))
}
