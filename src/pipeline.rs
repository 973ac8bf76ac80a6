//! The per-podcast update flow and the concurrent batch driver.
//!
//! Within one podcast the stages are strictly sequential: nothing is parsed
//! until the transport classifies the body as updated, and nothing is
//! merged until parsing completes. Across podcasts the pipelines share no
//! mutable state, so the batch driver fans them out over a bounded worker
//! pool; each podcast's failure is logged and isolated, never aborting its
//! siblings.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};

use crate::error::FeedError;
use crate::model::{CacheValidators, EpisodeRecord, ParsedFeed, Podcast};
use crate::parser;
use crate::reconcile::{self, MergeResult};
use crate::transport::{FetchOutcome, Fetcher};

/// Default cap on simultaneous outbound fetches in [`update_all`].
pub const DEFAULT_CONCURRENCY: usize = 10;

/// What one podcast update produced.
#[derive(Debug)]
pub enum UpdateOutcome {
    /// HTTP 304: the cached copy is current; nothing was parsed.
    Unchanged,
    /// The feed moved; the caller should persist the new URL and fetch it
    /// on the next cycle.
    MovedTo(String),
    /// The feed changed; parsed content and merge results attached.
    Updated(FeedUpdate),
}

/// Payload of a successful update: the normalized feed, the reconciler's
/// triple, and the fresh validators for the caller to persist.
#[derive(Debug)]
pub struct FeedUpdate {
    pub feed: ParsedFeed,
    pub new_episodes: Vec<EpisodeRecord>,
    pub updated_episodes: Vec<EpisodeRecord>,
    pub seen_guids: HashSet<String>,
    pub validators: CacheValidators,
}

/// Runs one podcast's fetch → parse → merge sequence.
///
/// `existing` is the podcast's stored episode collection; `max_episodes`
/// truncates to the newest N after sorting (0 = unlimited).
///
/// # Errors
///
/// Any [`FeedError`] from the transport or parser. Use
/// [`FeedError::is_fatal`] to decide whether to stop auto-updating the
/// subscription.
pub async fn update_podcast(
    fetcher: &Fetcher,
    podcast: &Podcast,
    existing: &[EpisodeRecord],
    max_episodes: usize,
) -> Result<UpdateOutcome, FeedError> {
    match fetcher.fetch(&podcast.url, &podcast.validators()).await? {
        FetchOutcome::NotModified => Ok(UpdateOutcome::Unchanged),
        FetchOutcome::Redirected(new_url) => Ok(UpdateOutcome::MovedTo(new_url)),
        FetchOutcome::Updated(fetched) => {
            let feed = parser::parse(fetched.data.as_slice(), &podcast.url, max_episodes)?;
            let MergeResult {
                new_episodes,
                updated_episodes,
                seen_guids,
            } = reconcile::merge(podcast.id, &feed, existing);
            tracing::debug!(
                podcast_id = podcast.id,
                new = new_episodes.len(),
                updated = updated_episodes.len(),
                "feed updated"
            );
            Ok(UpdateOutcome::Updated(FeedUpdate {
                feed,
                new_episodes,
                updated_episodes,
                seen_guids,
                validators: fetched.validators,
            }))
        }
    }
}

/// One podcast plus its stored episodes, queued for a batch update.
pub struct UpdateJob {
    pub podcast: Podcast,
    pub existing: Vec<EpisodeRecord>,
}

/// Per-podcast result of a batch run, correlated by podcast id.
pub struct UpdateResult {
    pub podcast_id: i64,
    pub result: Result<UpdateOutcome, FeedError>,
}

/// Updates many podcasts concurrently, at most `concurrency` in flight.
///
/// Results are returned in completion order, not input order. Failures are
/// logged and isolated per podcast; the batch always runs to completion.
pub async fn update_all(
    fetcher: &Fetcher,
    jobs: Vec<UpdateJob>,
    concurrency: usize,
    max_episodes: usize,
) -> Vec<UpdateResult> {
    let concurrency = concurrency.max(1);
    stream::iter(jobs)
        .map(|job| async move {
            let podcast_id = job.podcast.id;
            let result = update_podcast(fetcher, &job.podcast, &job.existing, max_episodes).await;
            if let Err(e) = &result {
                tracing::warn!(
                    podcast_id = podcast_id,
                    feed = %job.podcast.url,
                    error = %e,
                    fatal = e.is_fatal(),
                    "podcast update failed"
                );
            }
            UpdateResult { podcast_id, result }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await
}
