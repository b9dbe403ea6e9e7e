use framework::exception::CoreRsResult;
use tracing::Instrument;
use tracing::debug;
use tracing::debug_span;
use tracing::info;

use super::ChatPlatform;
use super::SourcePost;
use super::period::ResolvedPeriod;
use crate::snowflake::Snowflake;

pub const PAGE_SIZE: u16 = 100;

/// Posts with at least one attachment created inside the period, oldest first.
///
/// Pages forward from the first id of the month, so channel history before the
/// period is never read, and stops at the first post of the next month.
pub async fn fetch_month<P>(platform: &P, channel_id: Snowflake, period: &ResolvedPeriod) -> CoreRsResult<Vec<SourcePost>>
where
    P: ChatPlatform,
{
    let (start, end) = period.range()?;
    let span = debug_span!("fetch_month", %channel_id, %start, %end);
    async {
        let mut after = Snowflake(Snowflake::from_timestamp(start).0.saturating_sub(1));
        let mut posts = Vec::new();
        let mut scanned = 0;
        loop {
            let page = platform.messages_after(channel_id, after, PAGE_SIZE).await?;
            let Some(last) = page.last() else { break };
            after = last.id;
            let full_page = page.len() >= usize::from(PAGE_SIZE);
            scanned += page.len();
            debug!(page_size = page.len(), %after, reached = ?last.id.timestamp(), "fetched page");

            let mut reached_end = false;
            for post in page {
                if post.created_at >= end {
                    reached_end = true;
                    break;
                }
                if post.created_at >= start && !post.attachments.is_empty() {
                    posts.push(post);
                }
            }
            if reached_end || !full_page {
                break;
            }
        }
        info!(scanned, kept = posts.len(), "fetched month history");
        Ok(posts)
    }
    .instrument(span)
    .await
}
