use std::collections::BTreeMap;

use chrono::Datelike;
use rand::Rng;

use super::SourcePost;

#[derive(Debug, Clone)]
pub struct DailySample {
    pub day: u32,
    pub post: SourcePost,
}

pub fn sample_daily(posts: Vec<SourcePost>) -> Vec<DailySample> {
    sample_daily_with(posts, &mut rand::thread_rng())
}

/// One post per day of month, picked uniformly within each day.
pub fn sample_daily_with<R>(posts: Vec<SourcePost>, rng: &mut R) -> Vec<DailySample>
where
    R: Rng + ?Sized,
{
    let mut days: BTreeMap<u32, Vec<SourcePost>> = BTreeMap::new();
    for post in posts {
        days.entry(post.created_at.day()).or_default().push(post);
    }

    days.into_iter()
        .filter(|(_, posts)| !posts.is_empty())
        .map(|(day, mut posts)| {
            let index = rng.gen_range(0..posts.len());
            DailySample {
                day,
                post: posts.swap_remove(index),
            }
        })
        .collect()
}
